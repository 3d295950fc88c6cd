use crate::optimizer::OutputFormat;
use std::path::PathBuf;

pub enum Command {
    // Optimizer
    Optimize {
        inputs: Vec<PathBuf>,
        out_dir: PathBuf,
        max_width: Option<u32>,
        max_height: Option<u32>,
        quality: Option<f32>,
        format: Option<OutputFormat>,
        no_resize: bool,
        no_compression: bool,
    },
    Thumbnail {
        input: PathBuf,
        size: u32,
    },
    Probe {
        input: PathBuf,
    },
    Formats,
    // Result cache
    CacheStats,
    CacheLookup {
        input: PathBuf,
        model: String,
    },
    CachePut {
        input: PathBuf,
        model: String,
        result_json: String,
        ttl_secs: Option<u64>,
    },
    CacheList {
        model: String,
    },
    CacheClear,
    CacheClearModel {
        model: String,
    },
    CacheSweep,
}
