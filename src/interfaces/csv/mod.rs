pub mod order_writer;
pub mod script_reader;
pub mod seed_reader;
