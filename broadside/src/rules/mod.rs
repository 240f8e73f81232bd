pub mod damage;
pub mod defense;
pub mod salvo;
pub mod special;
