pub mod procurement;
