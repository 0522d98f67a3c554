//! Node identity and project descriptions.
//!
//! A [`Node`] is a package namespaced by the project that declares it, so
//! `http@app` and `http@vendor` are different nodes. A [`Project`] is the
//! already-parsed description handed to the graph by project loading.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One buildable unit: a package within the project that declared it.
///
/// Ordering is by package name first, then project name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Node {
    /// Package name.
    pub package: String,
    /// Name of the project that declared the package as a dependency.
    pub project: String,
}

impl Node {
    /// Create a node for `package` declared by `project`.
    pub fn new(package: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            project: project.into(),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.package, self.project)
    }
}

/// A project and the packages it declares as direct dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project name; used as the namespace of every node it declares.
    pub name: String,
    /// Declared dependency package names, in declaration order.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Project {
    pub fn new<I, S>(name: impl Into<String>, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            dependencies: dependencies.into_iter().map(Into::into).collect(),
        }
    }

    /// One node per declared dependency, labeled with this project's name.
    pub fn dependency_nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.dependencies
            .iter()
            .map(|package| Node::new(package.clone(), self.name.clone()))
    }
}
