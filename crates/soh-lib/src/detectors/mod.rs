pub mod dv;
