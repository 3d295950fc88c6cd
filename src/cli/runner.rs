use crate::cache::ResultCache;
use crate::optimizer::{
    ImageOptimizer, OptimizeOptions, calculate_size_reduction, is_webp_supported, optimal_format,
    probe_metadata,
};
use crate::types::ImageFile;
use std::collections::HashSet;
use std::io::Write;
use std::time::Duration;

use super::command::Command;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputMode {
    Human,
    Plain,
    Json,
}

/// Everything a command may touch.
pub struct Context {
    pub cache: ResultCache,
    pub optimizer: ImageOptimizer,
    /// Defaults that `optimize` flags override.
    pub options: OptimizeOptions,
}

fn input_file(path: &std::path::Path) -> Result<ImageFile, Box<dyn std::error::Error>> {
    if !path.is_file() {
        return Err(format!("no such file: {}", path.display()).into());
    }
    Ok(ImageFile::from_path(path))
}

/// Returns `name`, or `stem-N.ext` with the smallest free `N` when `name` is taken.
fn unique_output_name(name: &str, taken: &mut HashSet<String>) -> String {
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };
    let mut candidate = name.to_string();
    let mut n = 1;
    while taken.contains(&candidate) {
        candidate = match ext {
            Some(ext) => format!("{stem}-{n}.{ext}"),
            None => format!("{stem}-{n}"),
        };
        n += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

/// Runs `cmd`, writing its report to `out` in the requested mode.
///
/// # Errors
/// Returns the first error raised by the command or by writing to `out`.
pub async fn run_with_format(
    ctx: &Context,
    cmd: Command,
    mode: OutputMode,
    out: &mut dyn Write,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Command::Optimize {
            inputs,
            out_dir,
            max_width,
            max_height,
            quality,
            format,
            no_resize,
            no_compression,
        } => {
            let mut options = ctx.options.clone();
            if let Some(w) = max_width {
                options.max_width = w;
            }
            if let Some(h) = max_height {
                options.max_height = h;
            }
            if let Some(q) = quality {
                options.quality = q;
            }
            if let Some(f) = format {
                options.format = f;
            }
            options.enable_resize &= !no_resize;
            options.enable_compression &= !no_compression;

            let mut files = Vec::with_capacity(inputs.len());
            for p in &inputs {
                let f = input_file(p)?;
                f.validate_extension()?;
                files.push(f);
            }
            tokio::fs::create_dir_all(&out_dir).await?;
            let optimized = ctx
                .optimizer
                .optimize_images(&files, &options, |done, total| {
                    log::debug!("optimized {done}/{total}");
                })
                .await;
            let mut taken = HashSet::new();
            let mut written = Vec::with_capacity(optimized.len());
            for img in &optimized {
                let name = unique_output_name(img.file.name(), &mut taken);
                if name != img.file.name() {
                    log::warn!("output name '{}' already used, writing '{name}'", img.file.name());
                }
                let bytes = img.file.read_bytes().await?;
                tokio::fs::write(out_dir.join(&name), &bytes[..]).await?;
                written.push(name);
            }
            let reduction = calculate_size_reduction(&optimized);
            match mode {
                OutputMode::Json => {
                    let files: Vec<_> = optimized
                        .iter()
                        .zip(&written)
                        .map(|(i, name)| {
                            serde_json::json!({
                                "name": name,
                                "originalSize": i.original_size,
                                "optimizedSize": i.optimized_size,
                                "compressionRatio": i.compression_ratio,
                                "width": i.width,
                                "height": i.height,
                            })
                        })
                        .collect();
                    let json = serde_json::json!({"files": files, "reduction": reduction});
                    writeln!(out, "{json}")?;
                }
                OutputMode::Plain => {
                    for (i, name) in optimized.iter().zip(&written) {
                        writeln!(out, "{name} {} {}", i.original_size, i.optimized_size)?;
                    }
                }
                OutputMode::Human => {
                    for (i, name) in optimized.iter().zip(&written) {
                        writeln!(
                            out,
                            "{name}: {} -> {} bytes (ratio {:.2})",
                            i.original_size,
                            i.optimized_size,
                            i.compression_ratio
                        )?;
                    }
                    writeln!(
                        out,
                        "saved {} bytes ({:.1}%)",
                        reduction.reduction_bytes, reduction.reduction_percentage
                    )?;
                }
            }
            Ok(())
        }
        Command::Thumbnail { input, size } => {
            let file = input_file(&input)?;
            let url = ctx.optimizer.generate_thumbnail(&file, size).await?;
            match mode {
                OutputMode::Json => writeln!(out, "{}", serde_json::json!({"thumbnail": url}))?,
                _ => writeln!(out, "{url}")?,
            }
            Ok(())
        }
        Command::Probe { input } => {
            let meta = probe_metadata(&input_file(&input)?).await?;
            match mode {
                OutputMode::Json => writeln!(out, "{}", serde_json::to_string(&meta)?)?,
                OutputMode::Plain => {
                    writeln!(out, "{} {} {} {}", meta.format, meta.width, meta.height, meta.size_bytes)?;
                }
                OutputMode::Human => writeln!(
                    out,
                    "{}: {} {}x{} ({} bytes)",
                    meta.filename, meta.format, meta.width, meta.height, meta.size_bytes
                )?,
            }
            Ok(())
        }
        Command::Formats => {
            let webp = is_webp_supported();
            let best = optimal_format();
            match mode {
                OutputMode::Json => {
                    let json = serde_json::json!({"webp": webp, "optimal": best});
                    writeln!(out, "{json}")?;
                }
                OutputMode::Plain => writeln!(out, "webp={webp} optimal={}", best.extension())?,
                OutputMode::Human => {
                    writeln!(out, "webp encoding: {}", if webp { "supported" } else { "unavailable" })?;
                    writeln!(out, "optimal format: {}", best.mime_type())?;
                }
            }
            Ok(())
        }
        Command::CacheStats => {
            let stats = ctx.cache.stats();
            match mode {
                OutputMode::Json => writeln!(out, "{}", serde_json::to_string(&stats)?)?,
                OutputMode::Plain => writeln!(
                    out,
                    "entries={} hit_rate={:.3} bytes={}",
                    stats.total_entries, stats.hit_rate, stats.memory_usage
                )?,
                OutputMode::Human => writeln!(out, "{}", serde_json::to_string_pretty(&stats)?)?,
            }
            Ok(())
        }
        Command::CacheLookup { input, model } => {
            let file = input_file(&input)?;
            let hit = ctx.cache.get(&file, &model).await;
            match (mode, hit) {
                (OutputMode::Json, hit) => {
                    let json = serde_json::json!({"hit": hit.is_some(), "result": hit});
                    writeln!(out, "{json}")?;
                }
                (_, Some(v)) => writeln!(out, "{v}")?,
                (_, None) => writeln!(out, "miss")?,
            }
            Ok(())
        }
        Command::CachePut { input, model, result_json, ttl_secs } => {
            let file = input_file(&input)?;
            let value: serde_json::Value = serde_json::from_str(&result_json)?;
            match ttl_secs {
                Some(s) => ctx.cache.set_with_ttl(&file, &model, value, Duration::from_secs(s)).await,
                None => ctx.cache.set(&file, &model, value).await,
            }
            let key = ctx.cache.key_for(&file, &model).await?;
            match mode {
                OutputMode::Json => writeln!(out, "{}", serde_json::json!({"action": "stored", "key": key}))?,
                OutputMode::Plain => writeln!(out, "{key}")?,
                OutputMode::Human => writeln!(out, "stored key={key}")?,
            }
            Ok(())
        }
        Command::CacheList { model } => {
            let entries = ctx.cache.model_results(&model);
            match mode {
                OutputMode::Json => writeln!(out, "{}", serde_json::to_string(&entries)?)?,
                _ => {
                    for e in entries {
                        writeln!(out, "{} {} {}", e.timestamp, e.filename, e.file_hash)?;
                    }
                }
            }
            Ok(())
        }
        Command::CacheClear => {
            let n = ctx.cache.len();
            ctx.cache.clear();
            match mode {
                OutputMode::Json => writeln!(out, "{}", serde_json::json!({"action": "cleared", "removed": n}))?,
                _ => writeln!(out, "cleared {n}")?,
            }
            Ok(())
        }
        Command::CacheClearModel { model } => {
            let n = ctx.cache.clear_model(&model);
            match mode {
                OutputMode::Json => {
                    writeln!(out, "{}", serde_json::json!({"model": model, "removed": n}))?;
                }
                _ => writeln!(out, "removed {n}")?,
            }
            Ok(())
        }
        Command::CacheSweep => {
            let report = ctx.cache.run_maintenance();
            match mode {
                OutputMode::Json => writeln!(out, "{}", serde_json::to_string(&report)?)?,
                _ => writeln!(
                    out,
                    "expired={} trimmed={} remaining={}",
                    report.expired_removed, report.trimmed, report.remaining
                )?,
            }
            Ok(())
        }
    }
}
