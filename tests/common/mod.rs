#![allow(dead_code)]

pub mod temp_files {
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// A manifest written into its own temporary directory; the directory is
    /// removed when the value is dropped.
    pub struct TempManifest {
        _dir: TempDir,
        pub path: PathBuf,
    }

    /// Write `content` to `routes.<ext>` in a fresh temporary directory
    pub fn create_temp_manifest(content: &str, ext: &str) -> TempManifest {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(format!("routes.{ext}"));
        std::fs::write(&path, content).unwrap();
        TempManifest { _dir: dir, path }
    }

    pub fn create_temp_toml(content: &str) -> TempManifest {
        create_temp_manifest(content, "toml")
    }

    pub fn create_temp_json(content: &str) -> TempManifest {
        create_temp_manifest(content, "json")
    }
}

pub mod zoo {
    use brrtrouting::constraints::ConstraintResolver;
    use brrtrouting::data_source::{DefaultEndpointDataSource, EndpointDataSource};
    use brrtrouting::linking::LinkGenerator;
    use brrtrouting::manifest::RouteManifest;
    use brrtrouting::router::Router;
    use brrtrouting::runtime_config::RoutingOptions;
    use std::sync::Arc;

    pub const ZOO_MANIFEST: &str = r#"
[[endpoints]]
template = "/"
name = "root"
handler = "root_handler"
methods = ["GET"]

[[endpoints]]
template = "/zoo/animals"
name = "animals"
handler = "get_animals"
methods = ["GET"]

[[endpoints]]
template = "/zoo/animals"
handler = "create_animal"
methods = ["POST"]

[[endpoints]]
template = "/zoo/animals/new"
handler = "new_animal_form"
methods = ["GET"]

[[endpoints]]
template = "/zoo/animals/{id:int}"
name = "animal"
handler = "get_animal"
methods = ["GET"]

[[endpoints]]
template = "/zoo/animals/{id:int}"
handler = "update_animal"
methods = ["PUT", "PATCH"]

[[endpoints]]
template = "/zoo/animals/{id:int}"
handler = "delete_animal"
methods = ["DELETE"]

[[endpoints]]
template = "/zoo/animals/{slug}"
name = "animal_by_slug"
handler = "get_animal_by_slug"
methods = ["GET"]

[[endpoints]]
template = "/zoo/animals/{id}/toys/{toy_id}"
name = "toy"
handler = "animal_toy"

[[endpoints]]
template = "/zoo/{category}/animals/{id}/habitats/{habitat_id}"
handler = "habitat"

[[endpoints]]
template = "/zoo/health"
handler = "health_check"
methods = ["HEAD", "OPTIONS"]

[[endpoints]]
template = "/keepers/{*path}"
name = "keepers"
handler = "keeper_files"

[[endpoints]]
template = "/admin/settings"
handler = "admin_settings"
hosts = ["admin.zoo.example"]
"#;

    pub fn source() -> Arc<dyn EndpointDataSource> {
        let manifest = RouteManifest::from_toml_str(ZOO_MANIFEST).unwrap();
        Arc::new(DefaultEndpointDataSource::new(manifest.build_endpoints().unwrap()))
    }

    pub fn router() -> Router {
        Router::new(source(), ConstraintResolver::default(), RoutingOptions::default())
    }

    pub fn links() -> LinkGenerator {
        LinkGenerator::new(source(), ConstraintResolver::default(), RoutingOptions::default())
    }
}
