use std::fs;

use anyhow::{ensure, Context, Result};
use ferry_config::FerryConfig;
use ferry_layout::{layout_handles, m1_layout_files, m2_handle_catalog, map_area, ViewMapper};

use crate::ViewMappingArgs;

pub(crate) fn run(config: &FerryConfig, args: &ViewMappingArgs) -> Result<i32> {
    ensure!(
        args.m1.is_dir(),
        "m1 path {} doesn't exist or is not a directory",
        args.m1.display()
    );
    ensure!(
        args.m2.is_dir(),
        "m2 path {} doesn't exist or is not a directory",
        args.m2.display()
    );
    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;

    for (area, subareas) in &config.layout.areas {
        let mapper = ViewMapper::new(m2_handle_catalog(&args.m2, area));

        let mut handles = Vec::new();
        for file in m1_layout_files(&args.m1, area, subareas) {
            let xml = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            match layout_handles(&xml) {
                Ok(found) => handles.extend(found),
                Err(err) => tracing::warn!(
                    target: "ferry.cli",
                    file = %file.display(),
                    error = %err,
                    "skipping layout file"
                ),
            }
        }

        let mapping = map_area(&mapper, area, &handles)?;
        let out = args.out.join(format!("view_mapping_{area}.json"));
        let json = serde_json::to_string_pretty(&mapping)?;
        fs::write(&out, json + "\n").with_context(|| format!("could not write {}", out.display()))?;
        tracing::info!(
            target: "ferry.cli",
            area = %area,
            handles = mapping.len(),
            m2_handles = mapper.catalog().len(),
            path = %out.display(),
            "view mapping written"
        );
        println!("{area}: {} handles -> {}", mapping.len(), out.display());
    }
    Ok(0)
}
