pub mod decryptor;
pub mod lzss;
pub mod prob_model;
