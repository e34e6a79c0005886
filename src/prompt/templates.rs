/// One selectable entry in a facet of the template catalog.
///
/// `keywords` order is significant: it is the order the keywords are
/// emitted into a composed prompt.
#[derive(Debug, Clone, Copy)]
pub struct TemplateOption {
    pub key: &'static str,
    pub label: &'static str,
    pub glyph: &'static str,
    pub keywords: &'static [&'static str],
    pub description: &'static str,
}

/// The four categorical axes a user can pick from when building a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    SubjectType,
    Background,
    Lighting,
    Mood,
}

impl Facet {
    pub const ALL: [Facet; 4] = [
        Facet::SubjectType,
        Facet::Background,
        Facet::Lighting,
        Facet::Mood,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Facet::SubjectType => "subject_type",
            Facet::Background => "background",
            Facet::Lighting => "lighting",
            Facet::Mood => "mood",
        }
    }

    /// All options of this facet, in declaration order. The order is stable
    /// and is what facet pickers render.
    pub fn options(self) -> &'static [TemplateOption] {
        match self {
            Facet::SubjectType => SUBJECT_OPTIONS,
            Facet::Background => BACKGROUND_OPTIONS,
            Facet::Lighting => LIGHTING_OPTIONS,
            Facet::Mood => MOOD_OPTIONS,
        }
    }

    /// Resolves `key` within this facet. Unknown keys are absence, not an
    /// error: stale or hand-crafted client selections must degrade to "no
    /// contribution" instead of failing a whole composition.
    pub fn lookup(self, key: &str) -> Option<&'static TemplateOption> {
        self.options().iter().find(|option| option.key == key)
    }
}

pub const SUBJECT_OPTIONS: &[TemplateOption] = &[
    TemplateOption {
        key: "portrait",
        label: "Portrait",
        glyph: "\u{1F464}",
        keywords: &[
            "portrait photography",
            "professional headshot",
            "eye contact",
            "facial expression",
            "shallow depth of field",
            "bokeh background",
        ],
        description: "Professional portrait photography with focus on person",
    },
    TemplateOption {
        key: "lifestyle",
        label: "Lifestyle",
        glyph: "\u{1F31F}",
        keywords: &[
            "lifestyle photography",
            "candid moment",
            "authentic",
            "environmental context",
            "storytelling composition",
            "relatable",
        ],
        description: "Candid lifestyle moments and authentic scenarios",
    },
    TemplateOption {
        key: "product",
        label: "Product",
        glyph: "\u{1F4E6}",
        keywords: &[
            "product photography",
            "commercial quality",
            "centered composition",
            "sharp details",
            "professional styling",
            "clean presentation",
        ],
        description: "Professional product photography for e-commerce",
    },
    TemplateOption {
        key: "food",
        label: "Food",
        glyph: "\u{1F37D}\u{FE0F}",
        keywords: &[
            "food photography",
            "appetizing",
            "beautifully plated",
            "detailed textures",
            "overhead shot",
            "culinary presentation",
        ],
        description: "Delicious food photography with artistic plating",
    },
    TemplateOption {
        key: "landscape",
        label: "Landscape",
        glyph: "\u{1F304}",
        keywords: &[
            "landscape photography",
            "wide angle",
            "breathtaking vista",
            "natural beauty",
            "foreground interest",
            "majestic",
        ],
        description: "Stunning landscape and nature photography",
    },
    TemplateOption {
        key: "interior",
        label: "Interior",
        glyph: "\u{1F3E0}",
        keywords: &[
            "interior photography",
            "architectural",
            "spatial composition",
            "design aesthetic",
            "room styling",
            "modern space",
        ],
        description: "Interior design and architectural photography",
    },
    TemplateOption {
        key: "abstract",
        label: "Abstract",
        glyph: "\u{1F3A8}",
        keywords: &[
            "abstract art",
            "artistic composition",
            "creative vision",
            "conceptual",
            "dynamic forms",
            "modern art",
        ],
        description: "Abstract and artistic creative imagery",
    },
    TemplateOption {
        key: "fashion",
        label: "Fashion",
        glyph: "\u{1F457}",
        keywords: &[
            "fashion photography",
            "editorial style",
            "haute couture",
            "stylish",
            "runway aesthetic",
            "designer clothing",
        ],
        description: "High-fashion editorial photography",
    },
];

pub const BACKGROUND_OPTIONS: &[TemplateOption] = &[
    TemplateOption {
        key: "minimal_white",
        label: "Minimal White",
        glyph: "\u{26AA}",
        keywords: &[
            "white background",
            "minimalist",
            "clean",
            "uncluttered",
            "negative space",
            "simple backdrop",
        ],
        description: "Clean white minimal background for focus on subject",
    },
    TemplateOption {
        key: "natural_outdoor",
        label: "Natural Outdoor",
        glyph: "\u{1F33F}",
        keywords: &[
            "natural outdoor setting",
            "environmental context",
            "organic environment",
            "landscape background",
            "authentic location",
        ],
        description: "Natural outdoor environment and scenery",
    },
    TemplateOption {
        key: "urban_city",
        label: "Urban City",
        glyph: "\u{1F3D9}\u{FE0F}",
        keywords: &[
            "urban setting",
            "city background",
            "street photography aesthetic",
            "metropolitan",
            "architectural backdrop",
        ],
        description: "Urban city environment with buildings and streets",
    },
    TemplateOption {
        key: "studio_setup",
        label: "Studio Setup",
        glyph: "\u{1F4F8}",
        keywords: &[
            "studio background",
            "professional setup",
            "controlled environment",
            "seamless backdrop",
            "photography studio",
        ],
        description: "Professional photography studio environment",
    },
    TemplateOption {
        key: "indoor_cozy",
        label: "Indoor Cozy",
        glyph: "\u{1F6CB}\u{FE0F}",
        keywords: &[
            "cozy indoor setting",
            "warm interior",
            "comfortable space",
            "home environment",
            "inviting atmosphere",
        ],
        description: "Warm and inviting indoor environment",
    },
    TemplateOption {
        key: "textured",
        label: "Textured Surface",
        glyph: "\u{1FAB5}",
        keywords: &[
            "textured background",
            "rustic surface",
            "wooden backdrop",
            "organic texture",
            "material detail",
        ],
        description: "Textured surfaces like wood, concrete, or fabric",
    },
    TemplateOption {
        key: "gradient",
        label: "Gradient",
        glyph: "\u{1F308}",
        keywords: &[
            "gradient background",
            "smooth color transition",
            "modern backdrop",
            "soft blend",
            "colorful gradient",
        ],
        description: "Smooth gradient background with color transitions",
    },
    TemplateOption {
        key: "bokeh",
        label: "Bokeh Blur",
        glyph: "\u{2728}",
        keywords: &[
            "bokeh background",
            "out of focus",
            "shallow depth of field",
            "dreamy backdrop",
            "blurred lights",
        ],
        description: "Beautiful bokeh blur effect in background",
    },
];

pub const LIGHTING_OPTIONS: &[TemplateOption] = &[
    TemplateOption {
        key: "golden_hour",
        label: "Golden Hour",
        glyph: "\u{1F305}",
        keywords: &[
            "golden hour lighting",
            "warm sunset glow",
            "soft golden light",
            "magic hour",
            "amber tones",
        ],
        description: "Warm, soft lighting during golden hour (sunrise/sunset)",
    },
    TemplateOption {
        key: "studio_lighting",
        label: "Studio Lighting",
        glyph: "\u{1F4A1}",
        keywords: &[
            "studio lighting",
            "professional setup",
            "controlled lighting",
            "even illumination",
            "soft shadows",
        ],
        description: "Professional studio lighting setup",
    },
    TemplateOption {
        key: "natural_window",
        label: "Natural Window Light",
        glyph: "\u{1FA9F}",
        keywords: &[
            "natural window light",
            "soft diffused light",
            "indoor natural lighting",
            "gentle illumination",
            "window glow",
        ],
        description: "Soft natural light coming through windows",
    },
    TemplateOption {
        key: "dramatic",
        label: "Dramatic",
        glyph: "\u{26A1}",
        keywords: &[
            "dramatic lighting",
            "high contrast",
            "bold shadows",
            "cinematic lighting",
            "intense illumination",
        ],
        description: "High contrast dramatic lighting with strong shadows",
    },
    TemplateOption {
        key: "soft_diffused",
        label: "Soft Diffused",
        glyph: "\u{2601}\u{FE0F}",
        keywords: &[
            "soft diffused lighting",
            "gentle illumination",
            "even light",
            "flattering light",
            "minimal shadows",
        ],
        description: "Soft, even lighting with minimal harsh shadows",
    },
    TemplateOption {
        key: "blue_hour",
        label: "Blue Hour",
        glyph: "\u{1F306}",
        keywords: &[
            "blue hour lighting",
            "twilight",
            "cool blue tones",
            "dusk atmosphere",
            "evening glow",
        ],
        description: "Cool blue tones during twilight (blue hour)",
    },
    TemplateOption {
        key: "backlit",
        label: "Backlit",
        glyph: "\u{1F506}",
        keywords: &[
            "backlit",
            "rim lighting",
            "silhouette effect",
            "glowing edges",
            "halo effect",
        ],
        description: "Subject backlit with light source behind",
    },
    TemplateOption {
        key: "harsh_shadows",
        label: "Harsh Shadows",
        glyph: "\u{1F31E}",
        keywords: &[
            "harsh shadows",
            "strong directional light",
            "high contrast",
            "midday sun",
            "bold shadow patterns",
        ],
        description: "Strong directional lighting with pronounced shadows",
    },
];

pub const MOOD_OPTIONS: &[TemplateOption] = &[
    TemplateOption {
        key: "warm_cozy",
        label: "Warm & Cozy",
        glyph: "\u{2615}",
        keywords: &[
            "warm atmosphere",
            "cozy mood",
            "inviting",
            "comfortable",
            "warm earthy tones",
            "homey feeling",
        ],
        description: "Warm, inviting, and comfortable atmosphere",
    },
    TemplateOption {
        key: "energetic_vibrant",
        label: "Energetic & Vibrant",
        glyph: "\u{26A1}",
        keywords: &[
            "energetic mood",
            "vibrant colors",
            "dynamic composition",
            "lively atmosphere",
            "bold and exciting",
        ],
        description: "High energy, vibrant, and dynamic feeling",
    },
    TemplateOption {
        key: "luxurious_elegant",
        label: "Luxurious & Elegant",
        glyph: "\u{1F48E}",
        keywords: &[
            "luxurious aesthetic",
            "elegant style",
            "sophisticated",
            "high-end",
            "refined atmosphere",
            "premium quality",
        ],
        description: "Sophisticated, elegant, and luxurious vibe",
    },
    TemplateOption {
        key: "calm_serene",
        label: "Calm & Serene",
        glyph: "\u{1F9D8}",
        keywords: &[
            "calm atmosphere",
            "serene mood",
            "peaceful",
            "tranquil",
            "relaxing vibe",
            "zen aesthetic",
        ],
        description: "Peaceful, calm, and tranquil atmosphere",
    },
    TemplateOption {
        key: "professional_clean",
        label: "Professional & Clean",
        glyph: "\u{1F4BC}",
        keywords: &[
            "professional aesthetic",
            "clean composition",
            "corporate style",
            "polished",
            "business appropriate",
            "trustworthy",
        ],
        description: "Clean, professional, and business-oriented",
    },
    TemplateOption {
        key: "playful_fun",
        label: "Playful & Fun",
        glyph: "\u{1F389}",
        keywords: &[
            "playful mood",
            "fun atmosphere",
            "whimsical",
            "lighthearted",
            "joyful vibe",
            "cheerful",
        ],
        description: "Fun, playful, and lighthearted feeling",
    },
    TemplateOption {
        key: "dark_moody",
        label: "Dark & Moody",
        glyph: "\u{1F319}",
        keywords: &[
            "dark moody aesthetic",
            "atmospheric",
            "mysterious",
            "deep shadows",
            "dramatic mood",
            "intense atmosphere",
        ],
        description: "Dark, moody, and atmospheric with deep tones",
    },
    TemplateOption {
        key: "bright_airy",
        label: "Bright & Airy",
        glyph: "\u{2600}\u{FE0F}",
        keywords: &[
            "bright and airy",
            "light and fresh",
            "clean aesthetic",
            "uplifting mood",
            "open atmosphere",
            "luminous",
        ],
        description: "Bright, airy, and fresh with lots of light",
    },
];

/// Quality phrases appended to every composed prompt unless the caller opts
/// out. Policy constants tuned for the image model, not catalog data.
pub const QUALITY_BOOST: &[&str] = &[
    "Instagram aesthetic",
    "professional quality",
    "sharp focus",
    "high resolution",
    "engaging composition",
];

/// One-click phrase bundle offered in manual prompt mode.
#[derive(Debug, Clone, Copy)]
pub struct QuickAddModifier {
    pub label: &'static str,
    pub value: &'static str,
}

pub const QUICK_ADD_MODIFIERS: &[QuickAddModifier] = &[
    QuickAddModifier {
        label: "Golden Hour",
        value: "golden hour lighting, warm glow",
    },
    QuickAddModifier {
        label: "Professional Quality",
        value: "professional quality, sharp focus, high resolution",
    },
    QuickAddModifier {
        label: "Instagram Aesthetic",
        value: "Instagram aesthetic, mobile-optimized, engaging",
    },
    QuickAddModifier {
        label: "Cinematic",
        value: "cinematic lighting, dramatic composition",
    },
    QuickAddModifier {
        label: "Bokeh Background",
        value: "shallow depth of field, bokeh background, blurred backdrop",
    },
    QuickAddModifier {
        label: "Vibrant Colors",
        value: "vibrant colors, saturated, bold palette",
    },
    QuickAddModifier {
        label: "Minimalist",
        value: "minimalist style, clean, simple, negative space",
    },
    QuickAddModifier {
        label: "High Contrast",
        value: "high contrast, dramatic lighting, bold shadows",
    },
    QuickAddModifier {
        label: "Soft & Dreamy",
        value: "soft diffused lighting, dreamy atmosphere, ethereal",
    },
    QuickAddModifier {
        label: "Ultra Detailed",
        value: "ultra detailed, 8k resolution, crisp, sharp",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_facet_has_eight_options() {
        for facet in Facet::ALL {
            assert_eq!(facet.options().len(), 8, "facet {}", facet.as_str());
        }
    }

    #[test]
    fn option_keys_are_unique_within_each_facet() {
        for facet in Facet::ALL {
            let options = facet.options();
            for (index, option) in options.iter().enumerate() {
                assert!(
                    !options[..index].iter().any(|other| other.key == option.key),
                    "duplicate key {} in facet {}",
                    option.key,
                    facet.as_str()
                );
            }
        }
    }

    #[test]
    fn lookup_finds_known_keys_and_rejects_unknown_ones() {
        let option = Facet::SubjectType.lookup("lifestyle").unwrap();
        assert_eq!(option.label, "Lifestyle");
        assert!(Facet::SubjectType.lookup("Lifestyle").is_none());
        assert!(Facet::Background.lookup("lifestyle").is_none());
        assert!(Facet::Mood.lookup("").is_none());
    }

    #[test]
    fn enumeration_order_is_stable() {
        let first: Vec<&str> = Facet::Lighting.options().iter().map(|o| o.key).collect();
        let second: Vec<&str> = Facet::Lighting.options().iter().map(|o| o.key).collect();
        assert_eq!(first, second);
        assert_eq!(first.first(), Some(&"golden_hour"));
        assert_eq!(first.last(), Some(&"harsh_shadows"));
    }

    #[test]
    fn options_carry_nonempty_keywords() {
        for facet in Facet::ALL {
            for option in facet.options() {
                assert!(!option.keywords.is_empty(), "{}", option.key);
                assert!(option.keywords.iter().all(|kw| !kw.is_empty()));
            }
        }
    }
}
