use assay_schema::{AssetPattern, UNSUPPORTED_PRIORITY};
use comfy_table::Table;

/// Print a table of how each filename is classified.
pub fn classify(filenames: &[String]) {
    let mut table = Table::new();
    table.set_header(vec!["File", "OS", "Arch", "Archive", "Priority"]);

    for name in filenames {
        table.add_row(row(name));
    }

    println!("{table}");
}

fn row(name: &str) -> Vec<String> {
    let pattern = AssetPattern::from_filename(name);
    let dash = || "-".to_string();

    let Some(platform) = pattern.platform() else {
        return vec![name.to_string(), dash(), dash(), dash(), dash()];
    };
    let (archive, priority) = match pattern.ext {
        Some(ext) => {
            let p = ext.priority(platform.os);
            let p = if p == UNSUPPORTED_PRIORITY {
                "unsupported".to_string()
            } else {
                p.to_string()
            };
            (ext.to_string(), p)
        }
        None => (dash(), dash()),
    };

    vec![
        name.to_string(),
        platform.os.to_string(),
        platform.arch.to_string(),
        archive,
        priority,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows() {
        assert_eq!(
            row("fd-v10.2.0-x86_64-unknown-linux-musl.tar.gz"),
            vec!["fd-v10.2.0-x86_64-unknown-linux-musl.tar.gz", "linux", "amd64", "tar.gz", "1"]
        );
        assert_eq!(
            row("tool-windows-amd64.tar.gz")[4],
            "unsupported".to_string()
        );
        assert_eq!(row("tool-windows-amd64.msi")[3], "-".to_string());
        assert_eq!(row("README.md"), vec!["README.md", "-", "-", "-", "-"]);
    }
}
