pub mod evaluate;
pub mod filter_blast;
pub mod predict;
pub mod sample_ids;
pub mod train;
