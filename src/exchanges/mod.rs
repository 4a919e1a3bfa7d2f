pub mod esbcenter;
