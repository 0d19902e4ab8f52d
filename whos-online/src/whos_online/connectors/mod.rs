pub(crate) mod discord;
