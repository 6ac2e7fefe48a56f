mod common;
mod lifecycle;
mod notification;
mod poller;
