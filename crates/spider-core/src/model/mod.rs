pub mod answer;
pub mod character;
pub mod id;
pub mod knowledge;
pub mod question;
