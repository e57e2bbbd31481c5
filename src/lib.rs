//! docscan - capture a document image, OCR it, and keep the image and text.
//!
//! The HTTP service lives in [`app`] and [`handlers`]; storage backends in
//! [`storage`] (image blobs) and [`store`] (document records); recognition in
//! [`ocr`]; the camera dialog model in [`capture`].

pub mod app;
pub mod capture;
pub mod config;
pub mod error;
pub mod handlers;
pub mod ocr;
pub mod pipeline;
pub mod schema;
pub mod storage;
pub mod store;
pub mod supabase;
