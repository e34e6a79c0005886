pub mod object_store;

pub use object_store::{
    delete_image, public_image_url, storage_round_trip_probe, upload_image_bytes,
    upload_image_from_url, StoredObject,
};
