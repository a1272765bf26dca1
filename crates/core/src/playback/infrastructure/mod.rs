pub mod rodio_sink;
