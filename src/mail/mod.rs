pub mod decoders;
pub mod folders;
pub mod parser;
