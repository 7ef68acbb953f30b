pub mod review_exporter;

pub use review_exporter::ReviewExporter;
