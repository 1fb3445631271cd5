//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use attackgraph_core::{
    AttackGraphError, GeneratedDataset, GenerationConfig, Generator, GraphMetrics, InstanceRange,
    PRESET_NAMES, Schema, dataset_digest, dataset_from_bytes, dataset_to_bytes,
    formats::MAX_DATASET_FILE_SIZE, peek_header, preset,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a schema file (1 MB).
const MAX_SCHEMA_FILE_SIZE: u64 = 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), AttackGraphError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| AttackGraphError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(AttackGraphError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and require a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, AttackGraphError> {
    let canonical = path.canonicalize().map_err(|e| {
        AttackGraphError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(AttackGraphError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Canonicalize the parent of an output path and require a directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, AttackGraphError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        AttackGraphError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(AttackGraphError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| AttackGraphError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// GENERATE COMMAND
// =============================================================================

/// What `generate` reports about a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub schema: String,
    pub seed: u64,
    pub node_count: usize,
    pub edge_count: usize,
    pub attack_node_count: usize,
    pub attack_edge_count: usize,
    pub instance_count: usize,
    pub feature_dimensions: usize,
    pub output: Option<String>,
    pub bytes_written: Option<usize>,
}

/// Run the pipeline and optionally save the dataset.
pub fn cmd_generate(
    json_mode: bool,
    schema_spec: &str,
    seed: u64,
    min_attacks: Option<usize>,
    max_attacks: Option<usize>,
    output: Option<&Path>,
) -> Result<(), AttackGraphError> {
    let summary = run_generate(schema_spec, seed, min_attacks, max_attacks, output)?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).unwrap_or_default()
        );
        return Ok(());
    }

    println!("attackgraph Generation");
    println!("======================");
    println!("Schema:    {}", summary.schema);
    println!("Seed:      {}", summary.seed);
    println!();
    println!("Nodes:         {}", summary.node_count);
    println!("Edges:         {}", summary.edge_count);
    println!("Attack Nodes:  {}", summary.attack_node_count);
    println!("Attack Edges:  {}", summary.attack_edge_count);
    println!("Instances:     {}", summary.instance_count);
    println!("Feature Dims:  {}", summary.feature_dimensions);
    if let (Some(path), Some(bytes)) = (&summary.output, summary.bytes_written) {
        println!();
        println!("Wrote {} bytes to {}", bytes, path);
    }

    Ok(())
}

/// The work behind `generate`, without printing.
pub fn run_generate(
    schema_spec: &str,
    seed: u64,
    min_attacks: Option<usize>,
    max_attacks: Option<usize>,
    output: Option<&Path>,
) -> Result<RunSummary, AttackGraphError> {
    // Validate the destination before spending time on generation.
    let validated_output = output.map(validate_output_path).transpose()?;

    let schema = load_schema(schema_spec)?;
    let config = GenerationConfig::with_seed(seed)
        .with_attack_instances(attack_range(min_attacks, max_attacks));
    let dataset = Generator::new(&schema, config)?.run()?;
    let metrics = GraphMetrics::from_dataset(&dataset)?;

    let bytes_written = match &validated_output {
        Some(path) => Some(write_dataset(path, &dataset)?),
        None => None,
    };

    Ok(RunSummary {
        schema: dataset.schema_name.clone(),
        seed,
        node_count: metrics.node_count,
        edge_count: metrics.edge_count,
        attack_node_count: metrics.attack_node_count,
        attack_edge_count: metrics.attack_edge_count,
        instance_count: metrics.instance_count,
        feature_dimensions: dataset.bundle.feature_dimensions,
        output: validated_output.map(|p| p.display().to_string()),
        bytes_written,
    })
}

/// Combine optional bounds with the default range.
pub fn attack_range(min: Option<usize>, max: Option<usize>) -> InstanceRange {
    let default = InstanceRange::default();
    match (min, max) {
        (Some(min), Some(max)) => InstanceRange::new(min, max),
        (Some(min), None) => InstanceRange::new(min, default.max.max(min)),
        (None, Some(max)) => InstanceRange::new(default.min.min(max), max),
        (None, None) => default,
    }
}

// =============================================================================
// STATS COMMAND
// =============================================================================

/// Show distribution statistics of a saved dataset.
pub fn cmd_stats(
    json_mode: bool,
    input: &Path,
    show_instances: bool,
) -> Result<(), AttackGraphError> {
    let dataset = read_dataset(input)?;
    let metrics = GraphMetrics::from_dataset(&dataset)?;

    if json_mode {
        let mut output = serde_json::json!({
            "schema": dataset.schema_name,
            "seed": dataset.seed,
            "metrics": metrics,
            "attack_node_ratio": metrics.attack_node_ratio(),
            "attack_edge_ratio": metrics.attack_edge_ratio(),
        });
        if show_instances {
            output["instances"] = serde_json::to_value(&dataset.bundle.attack_instances)
                .map_err(|e| AttackGraphError::SerializationError(e.to_string()))?;
        }
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("attackgraph Dataset Statistics");
    println!("==============================");
    println!("File:   {:?}", input);
    println!("Schema: {}", dataset.schema_name);
    println!("Seed:   {}", dataset.seed);
    println!();
    println!("Nodes: {}", metrics.node_count);
    for entry in &metrics.node_types {
        println!("  {:<20} {}", entry.name, entry.count);
    }
    println!("Edges: {}", metrics.edge_count);
    for entry in &metrics.edge_types {
        println!("  {:<20} {}", entry.name, entry.count);
    }
    println!();
    println!(
        "Degree: mean {:.2}, min {}, max {}",
        metrics.degree.mean, metrics.degree.min, metrics.degree.max
    );
    println!();
    println!(
        "Attack Nodes:      {} ({:.2}%)",
        metrics.attack_node_count,
        metrics.attack_node_ratio() * 100.0
    );
    println!(
        "Attack Edges:      {} ({:.2}%)",
        metrics.attack_edge_count,
        metrics.attack_edge_ratio() * 100.0
    );
    println!("Instances:         {}", metrics.instance_count);
    println!("Boundary Crossed:  {}", metrics.boundary_crossed_count);
    println!("Forced Sensitive:  {}", metrics.forced_sensitive_count);
    println!("Forced Boundary:   {}", metrics.forced_boundary_count);
    println!("Mean Path Length:  {:.2}", metrics.mean_path_length);
    for (motif, count) in &metrics.motif_counts {
        println!("  {:<20} {}", motif, count);
    }

    if show_instances {
        println!();
        println!("Instances:");
        for (index, instance) in dataset.bundle.attack_instances.iter().enumerate() {
            println!(
                "  #{:<3} {:<6} len {:<2} crossed {:<5} nodes {:?}",
                index,
                instance.motif_id,
                instance.path_length,
                instance.boundary_crossed,
                instance.node_ids.iter().map(|n| n.0).collect::<Vec<_>>()
            );
        }
    }

    Ok(())
}

// =============================================================================
// VALIDATE COMMAND
// =============================================================================

/// Resolve a schema and report the first problem.
pub fn cmd_validate(json_mode: bool, schema_spec: &str) -> Result<(), AttackGraphError> {
    let schema = load_schema(schema_spec)?;
    let resolved = schema.resolve()?;

    if json_mode {
        let output = serde_json::json!({
            "valid": true,
            "name": resolved.name(),
            "node_types": resolved.node_types(),
            "relation_types": resolved.relation_types(),
            "total_nodes": resolved.total_nodes(),
            "motifs": resolved.motifs().len(),
            "feature_dimensions": resolved.feature_dimensions(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Schema '{}' is valid", resolved.name());
    println!("  Node types:     {}", resolved.node_types().len());
    println!("  Relations:      {}", resolved.relation_types().len());
    println!("  Total nodes:    {}", resolved.total_nodes());
    println!("  Motifs:         {}", resolved.motifs().len());
    println!("  Feature dims:   {}", resolved.feature_dimensions());

    Ok(())
}

// =============================================================================
// SCHEMAS COMMAND
// =============================================================================

/// List built-in presets, or print one as TOML.
pub fn cmd_schemas(json_mode: bool, dump: Option<&str>) -> Result<(), AttackGraphError> {
    if let Some(name) = dump {
        let schema = preset(name)?.ok_or_else(|| unknown_preset(name))?;
        print!("{}", schema.to_toml_string()?);
        return Ok(());
    }

    let mut entries = Vec::with_capacity(PRESET_NAMES.len());
    for name in PRESET_NAMES {
        let schema = preset(name)?.ok_or_else(|| unknown_preset(name))?;
        entries.push(serde_json::json!({
            "name": name,
            "title": schema.name,
            "node_types": schema.node_types.len(),
            "total_nodes": schema.total_nodes(),
            "motifs": schema.motifs.len(),
        }));
    }

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Built-in schemas:");
    for entry in &entries {
        println!(
            "  {:<14} {} nodes, {} motifs",
            entry["name"].as_str().unwrap_or_default(),
            entry["total_nodes"],
            entry["motifs"]
        );
    }

    Ok(())
}

// =============================================================================
// HASH COMMAND
// =============================================================================

/// Compute the BLAKE3 digest of a dataset file.
pub fn cmd_hash(json_mode: bool, input: &Path) -> Result<(), AttackGraphError> {
    let validated = validate_file_path(input)?;
    validate_file_size(&validated, MAX_DATASET_FILE_SIZE as u64)?;

    let bytes = std::fs::read(&validated)
        .map_err(|e| AttackGraphError::IoError(format!("Read file: {}", e)))?;
    let header = peek_header(&bytes)?;
    let digest = dataset_digest(&bytes);

    if json_mode {
        let output = serde_json::json!({
            "algorithm": "blake3",
            "hash": digest,
            "node_count": header.node_count,
            "edge_count": header.edge_count,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
    } else {
        println!("BLAKE3: {}", digest);
        println!("({} nodes, {} edges)", header.node_count, header.edge_count);
    }

    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn unknown_preset(name: &str) -> AttackGraphError {
    AttackGraphError::invalid(
        "schema",
        format!("unknown preset '{}'. Use: {}", name, PRESET_NAMES.join(", ")),
    )
}

/// Load a schema by preset name, or from a TOML file.
pub fn load_schema(spec: &str) -> Result<Schema, AttackGraphError> {
    if let Some(schema) = preset(spec)? {
        debug!(preset = spec, "using built-in schema");
        return Ok(schema);
    }

    let path = Path::new(spec);
    if !path.exists() {
        return Err(unknown_preset(spec));
    }
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, MAX_SCHEMA_FILE_SIZE)?;

    let text = std::fs::read_to_string(&validated)
        .map_err(|e| AttackGraphError::IoError(format!("Read schema: {}", e)))?;
    debug!(path = %validated.display(), "loaded schema file");
    Schema::from_toml_str(&text)
}

/// Read and fully validate a dataset file.
pub fn read_dataset(path: &Path) -> Result<GeneratedDataset, AttackGraphError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, MAX_DATASET_FILE_SIZE as u64)?;

    let bytes = std::fs::read(&validated)
        .map_err(|e| AttackGraphError::IoError(format!("Read file: {}", e)))?;
    dataset_from_bytes(&bytes)
}

/// Serialize and write a dataset. Returns the number of bytes written.
pub fn write_dataset(path: &Path, dataset: &GeneratedDataset) -> Result<usize, AttackGraphError> {
    let data = dataset_to_bytes(dataset)?;
    std::fs::write(path, &data)
        .map_err(|e| AttackGraphError::IoError(format!("Write file: {}", e)))?;
    info!(path = %path.display(), bytes = data.len(), "dataset written");
    Ok(data.len())
}
