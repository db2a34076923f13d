pub mod cli {
    pub mod commands;
    pub mod handlers;
    pub mod output;
}

pub mod io {
    pub mod lock;
    pub mod logging;
    pub mod recovery;
    pub mod state;
    pub mod store;
    pub mod watcher;
    pub mod workspace_io;
    pub mod writer;
}

pub mod model;

pub mod ops {
    pub mod check;
    pub mod drag;
    pub mod ordered;
    pub mod persist;
    pub mod reorder;
    pub mod resolve;
    pub mod section_ops;
}

pub mod tui;

pub mod util {
    pub mod unicode;
}
