pub mod scan; // Model response -> validated record + annotated scan
