pub mod action;
pub mod catalog;
pub mod conversation;
pub mod turn;
