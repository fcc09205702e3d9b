//! ONNX Runtime session setup shared by every model in the crate.

use std::fmt;
use std::path::{Path, PathBuf};

#[cfg(feature = "cuda")]
use ort::execution_providers::{CUDAExecutionProvider, ExecutionProvider};
use ort::execution_providers::{CPUExecutionProvider, ExecutionProviderDispatch};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;

/// Compute device the sessions run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda,
}

impl Device {
    /// Pick CUDA when the crate was built with `cuda` and the provider can
    /// be loaded, otherwise the CPU.
    pub fn detect() -> Self {
        #[cfg(feature = "cuda")]
        {
            match CUDAExecutionProvider::default().is_available() {
                Ok(true) => return Device::Cuda,
                Ok(false) => log::debug!("CUDA execution provider not available"),
                Err(e) => log::warn!("Failed to query CUDA execution provider: {e}"),
            }
        }
        Device::Cpu
    }

    fn execution_providers(self) -> Vec<ExecutionProviderDispatch> {
        match self {
            #[cfg(feature = "cuda")]
            Device::Cuda => vec![
                CUDAExecutionProvider::default().build(),
                CPUExecutionProvider::default().build(),
            ],
            _ => vec![CPUExecutionProvider::default().build()],
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Cuda => f.write_str("cuda"),
        }
    }
}

/// Parameters for configuring ONNX model loading.
#[derive(Debug, Clone)]
pub struct OnnxModelParams {
    /// Number of CPU threads to use for inference.
    /// `None` uses the ORT default (typically all available cores).
    pub num_threads: Option<usize>,
    /// Directory for caching Level3-optimized graphs, one file per model.
    ///
    /// - First load: ORT runs Level3 optimization and serialises the result here.
    /// - Subsequent loads: the pre-built graph is loaded at `Disable` optimization.
    pub optimized_model_cache_dir: Option<PathBuf>,
    /// Device to run on. Defaults to [`Device::detect`].
    pub device: Device,
}

impl Default for OnnxModelParams {
    fn default() -> Self {
        Self {
            num_threads: None,
            optimized_model_cache_dir: None,
            device: Device::detect(),
        }
    }
}

impl OnnxModelParams {
    fn cache_path(&self, onnx_path: &Path) -> Option<PathBuf> {
        let dir = self.optimized_model_cache_dir.as_ref()?;
        let stem = onnx_path.file_stem()?.to_string_lossy();
        Some(dir.join(format!("{stem}.optimized.onnx")))
    }
}

/// Initialize an ONNX session with optional on-disk graph caching.
///
/// The first time a model is loaded, ORT runs Level3 graph optimization
/// and serialises the result into the cache directory. Every subsequent
/// load reads the pre-optimized file directly at `Disable` optimization level.
pub fn init_session(onnx_path: &Path, params: &OnnxModelParams) -> ort::Result<Session> {
    let cache_path = params.cache_path(onnx_path);

    let (load_path, opt_level, write_cache) = match cache_path.as_deref() {
        // Pre-optimized graph already on disk → load it directly, skip optimization.
        Some(cache) if cache.exists() => {
            log::info!(
                "Loading pre-optimized graph ({:.1} MB) from {:?}",
                cache
                    .metadata()
                    .map(|m| m.len() as f64 / 1_048_576.0)
                    .unwrap_or(0.0),
                cache
            );
            (cache, GraphOptimizationLevel::Disable, None)
        }
        // Cache path given but file does not exist yet → build + persist.
        Some(cache) => {
            log::info!("First load: running Level3 optimization; saving graph to {cache:?}");
            (onnx_path, GraphOptimizationLevel::Level3, Some(cache))
        }
        None => (onnx_path, GraphOptimizationLevel::Level3, None),
    };

    let mut builder = Session::builder()?
        .with_optimization_level(opt_level)?
        .with_execution_providers(params.device.execution_providers())?;

    if let Some(cache) = write_cache {
        if let Some(dir) = cache.parent() {
            std::fs::create_dir_all(dir).map_err(|e| ort::Error::new(e.to_string()))?;
        }
        builder = builder.with_optimized_model_path(cache)?;
    }

    if let Some(threads) = params.num_threads {
        builder = builder
            .with_intra_threads(threads)?
            .with_inter_threads(threads)?;
    }

    builder.commit_from_file(load_path)
}

/// Names of the session inputs, in declaration order.
pub fn input_names(session: &Session) -> Vec<String> {
    session
        .inputs()
        .iter()
        .map(|input| input.name().to_string())
        .collect()
}

/// The first of `candidates` the session declares as an input.
pub fn find_input(session: &Session, candidates: &[&str]) -> Option<String> {
    let names = input_names(session);
    candidates
        .iter()
        .find(|c| names.iter().any(|n| n == *c))
        .map(|c| c.to_string())
}

/// Whether input `name` expects int32 (true) rather than another type.
pub fn input_is_int32(session: &Session, name: &str) -> Option<bool> {
    session
        .inputs()
        .iter()
        .find(|input| input.name() == name)
        .map(|input| {
            let type_str = format!("{:?}", input.dtype());
            type_str.contains("Int32") || type_str.contains("int32")
        })
}

/// Declared rank of tensor input `name`, read from the type description.
pub fn input_rank(session: &Session, name: &str) -> Option<usize> {
    let input = session.inputs().iter().find(|input| input.name() == name)?;
    parse_rank(&format!("{:?}", input.dtype()))
}

fn parse_rank(type_str: &str) -> Option<usize> {
    let after = &type_str[type_str.find("shape")?..];
    let open = after.find('[')?;
    let close = after[open..].find(']')? + open;
    let dims = after[open + 1..close].trim();
    if dims.is_empty() {
        return Some(0);
    }
    Some(dims.split(',').count())
}

/// Ensure `path` exists, with a download hint in the error.
pub fn require_file(path: &Path, what: &str) -> std::io::Result<()> {
    if path.exists() {
        return Ok(());
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!(
            "{what} not found at {}. Download it before running (see the binary's setup notes).",
            path.display()
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_is_read_from_the_shape_list() {
        assert_eq!(
            parse_rank("Tensor { ty: Float32, shape: [1, 80, -1, 1], dimension_symbols: [] }"),
            Some(4)
        );
        assert_eq!(parse_rank("Tensor { ty: Int64, shape: [1], dimension_symbols: [] }"), Some(1));
        assert_eq!(parse_rank("Tensor { ty: Float32, shape: [] }"), Some(0));
        assert_eq!(parse_rank("Sequence(Float32)"), None);
    }

    #[test]
    fn cache_path_is_per_model() {
        let params = OnnxModelParams {
            num_threads: None,
            optimized_model_cache_dir: Some(PathBuf::from("cache")),
            device: Device::Cpu,
        };
        assert_eq!(
            params.cache_path(Path::new("models/waveglow.onnx")),
            Some(PathBuf::from("cache/waveglow.optimized.onnx"))
        );

        let no_cache = OnnxModelParams {
            optimized_model_cache_dir: None,
            ..params
        };
        assert_eq!(no_cache.cache_path(Path::new("models/waveglow.onnx")), None);
    }

    #[test]
    fn require_file_names_the_missing_path() {
        let err = require_file(Path::new("nowhere/model.onnx"), "Encoder").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
        assert!(err.to_string().starts_with("Encoder not found at nowhere/model.onnx"));
    }

    #[test]
    fn device_names() {
        assert_eq!(Device::Cpu.to_string(), "cpu");
        assert_eq!(Device::Cuda.to_string(), "cuda");
    }

    #[test]
    fn default_params_use_the_detected_device() {
        assert_eq!(OnnxModelParams::default().device, Device::detect());
    }
}
