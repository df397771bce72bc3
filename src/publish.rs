use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    dataset::ChangelogDataset,
    error::{Error, Result},
};

/// Name of the data artifact holding the serialized changelog.
pub const ARTIFACT_NAME: &str = "changelog.json";

/// Name of the route manifest written by [`FsSite::write_manifest`].
pub const MANIFEST_NAME: &str = "routes.json";

/// A page route and the data artifact the page renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub path: String,
    pub data: PathBuf,
}

/// The part of a static site build the changelog needs: somewhere to store
/// data artifacts and a way to register pages.
pub trait Site {
    /// Stores `contents` under `name`, returning where it can be read back.
    fn create_data(&mut self, name: &str, contents: &str) -> Result<PathBuf>;

    fn add_route(&mut self, route: Route) -> Result<()>;
}

/// Joins the site base url with `changelog`, collapsing repeated slashes.
///
/// # Example
///
/// ```
/// # use doclog::publish::route_path;
/// assert_eq!(route_path("/"), "/changelog");
/// assert_eq!(route_path("/docs//"), "/docs/changelog");
/// assert_eq!(route_path("https://example.com/docs/"), "https://example.com/docs/changelog");
/// ```
pub fn route_path(base: &str) -> String {
    let (scheme, rest) = match base.find("://") {
        Some(idx) => base.split_at(idx + 3),
        None => ("", base),
    };
    let mut path = String::from(scheme);
    if scheme.is_empty() {
        path.push('/');
    }
    for segment in rest.split('/').filter(|s| !s.is_empty()) {
        path.push_str(segment);
        path.push('/');
    }
    path.push_str("changelog");
    path
}

/// A [`Site`] writing artifacts and a route manifest into a directory.
#[derive(Debug, Clone)]
pub struct FsSite {
    out_dir: PathBuf,
    routes: Vec<Route>,
}

impl FsSite {
    pub fn new<P: AsRef<Path>>(out_dir: P) -> FsSite {
        FsSite {
            out_dir: out_dir.as_ref().to_path_buf(),
            routes: Vec::new(),
        }
    }

    pub fn routes(&self) -> &[Route] { &self.routes }

    /// Writes every registered route to `routes.json` in the output directory.
    pub fn write_manifest(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(MANIFEST_NAME);
        fs::write(&path, serde_json::to_string_pretty(&self.routes)?)?;
        debug!("Wrote route manifest to {:?}", path);
        Ok(path)
    }
}

impl Site for FsSite {
    fn create_data(&mut self, name: &str, contents: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(name);
        fs::write(&path, contents)?;
        debug!("Wrote {} bytes to {:?}", contents.len(), path);
        Ok(path)
    }

    fn add_route(&mut self, route: Route) -> Result<()> {
        if self.routes.iter().any(|r| r.path == route.path) {
            return Err(Error::DuplicateRoute(route.path));
        }
        self.routes.push(route);
        Ok(())
    }
}

/// Hands a finished changelog to the site build.
#[derive(Debug, Clone)]
pub struct Publisher {
    base_url: String,
}

impl Publisher {
    pub fn new<S: Into<String>>(base_url: S) -> Publisher {
        Publisher {
            base_url: base_url.into(),
        }
    }

    /// Serializes `dataset` as JSON and registers the `changelog` page for it.
    /// An empty dataset still yields an artifact (`[]`) and a route.
    pub fn publish<S: Site + ?Sized>(&self, dataset: &ChangelogDataset, site: &mut S) -> Result<Route> {
        let json = serde_json::to_string_pretty(dataset)?;
        let data = site.create_data(ARTIFACT_NAME, &json)?;
        let route = Route {
            path: route_path(&self.base_url),
            data,
        };
        site.add_route(route.clone())?;
        info!(
            "Published changelog with {} months at {}",
            dataset.len(),
            route.path
        );
        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{dataset::ChangelogAssembler, monthmap::MonthlyGrouper, record::RecordParser};

    #[derive(Default)]
    struct MemorySite {
        data: HashMap<String, String>,
        routes: Vec<Route>,
    }

    impl Site for MemorySite {
        fn create_data(&mut self, name: &str, contents: &str) -> Result<PathBuf> {
            self.data.insert(name.to_owned(), contents.to_owned());
            Ok(PathBuf::from(name))
        }

        fn add_route(&mut self, route: Route) -> Result<()> {
            self.routes.push(route);
            Ok(())
        }
    }

    struct BrokenSite;

    impl Site for BrokenSite {
        fn create_data(&mut self, _name: &str, _contents: &str) -> Result<PathBuf> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }

        fn add_route(&mut self, _route: Route) -> Result<()> { Ok(()) }
    }

    #[test]
    fn route_paths_are_normalized() {
        assert_eq!(route_path(""), "/changelog");
        assert_eq!(route_path("/"), "/changelog");
        assert_eq!(route_path("//docs///site/"), "/docs/site/changelog");
        assert_eq!(route_path("docs"), "/docs/changelog");
        assert_eq!(route_path("https://fboss.dev//"), "https://fboss.dev/changelog");
    }

    #[test]
    fn empty_dataset_is_still_published() {
        let mut site = MemorySite::default();
        let route = Publisher::new("/")
            .publish(&ChangelogDataset::default(), &mut site)
            .unwrap();
        assert_eq!(route.path, "/changelog");
        assert_eq!(site.data[ARTIFACT_NAME], "[]");
        assert_eq!(site.routes, vec![route]);
    }

    #[test]
    fn artifact_round_trips() {
        let parsed = RecordParser::default().parse("h1\x002024-01-15\x00Fix\x00\n");
        let dataset = ChangelogAssembler::assemble(MonthlyGrouper::group(parsed.records));
        let mut site = MemorySite::default();
        Publisher::new("/docs/").publish(&dataset, &mut site).unwrap();

        let back: ChangelogDataset = serde_json::from_str(&site.data[ARTIFACT_NAME]).unwrap();
        assert_eq!(back, dataset);
        assert_eq!(site.routes[0].path, "/docs/changelog");
    }

    #[test]
    fn storage_failure_is_fatal() {
        let res = Publisher::new("/").publish(&ChangelogDataset::default(), &mut BrokenSite);
        assert!(matches!(res, Err(Error::Io(_))));
    }

    #[test]
    fn fs_site_writes_artifact_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("build").join("changelog");
        let mut site = FsSite::new(&out);
        let route = Publisher::new("/").publish(&ChangelogDataset::default(), &mut site).unwrap();

        assert_eq!(route.data, out.join(ARTIFACT_NAME));
        assert_eq!(fs::read_to_string(&route.data).unwrap(), "[]");

        let manifest = site.write_manifest().unwrap();
        let routes: Vec<Route> =
            serde_json::from_str(&fs::read_to_string(manifest).unwrap()).unwrap();
        assert_eq!(routes, vec![route]);
    }

    #[test]
    fn fs_site_rejects_second_registration() {
        let dir = tempfile::tempdir().unwrap();
        let mut site = FsSite::new(dir.path());
        let publisher = Publisher::new("/");
        publisher.publish(&ChangelogDataset::default(), &mut site).unwrap();
        let res = publisher.publish(&ChangelogDataset::default(), &mut site);
        assert!(matches!(res, Err(Error::DuplicateRoute(p)) if p == "/changelog"));
        assert_eq!(site.routes().len(), 1);
    }
}
