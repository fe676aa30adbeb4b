pub mod png_overlay_sink;
