pub mod die;
pub mod seat;
pub mod stakes;
