mod controls;
mod details;
mod fps;
mod panels;

pub(super) use panels::draw_loading;
