pub mod ean_pipeline;
