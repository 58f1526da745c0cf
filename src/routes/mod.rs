pub(crate) mod admin;
pub(crate) mod assets;
pub(crate) mod auth;
pub(crate) mod dashboard;
pub(crate) mod health;
pub(crate) mod portfolios;
pub(crate) mod recommendations;
