//! The two kinds of schedulable work: providers fetch upstream data,
//! goals consume it and emit output packages.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use metagen_core::Error;
use metagen_core::format::VersionOutput;

use crate::fetch::CachedClient;

/// Type-erased result of a provider run. Goals downcast it back to the
/// concrete type they share with the provider.
pub type ProviderValue = Arc<dyn Any + Send + Sync>;

/// A unit that fetches and normalizes one upstream data source.
///
/// Providers are deduplicated by id before a run, so one shared by
/// several goals executes exactly once.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable identifier, also the provider's cache namespace.
    fn id(&self) -> &'static str;

    async fn provide(&self, http: &CachedClient) -> Result<ProviderValue, Error>;
}

/// A unit that turns provider data into one output package.
pub trait Goal: Send + Sync {
    /// Package uid, e.g. `net.minecraft`. Also the output directory name.
    fn id(&self) -> &'static str;

    /// Human-readable package name.
    fn name(&self) -> &'static str;

    /// Providers this goal needs, in the order `generate` expects their
    /// results.
    fn deps(&self) -> Vec<Arc<dyn Provider>>;

    /// Produce the package's version records from the dependency data,
    /// one [`ProviderValue`] per declared dependency.
    fn generate(&self, data: &[ProviderValue]) -> Result<Vec<VersionOutput>, Error>;

    /// Whether `version` should be marked recommended. `first` is true
    /// until some earlier record of the same run was marked.
    fn recommend(&self, first: bool, version: &VersionOutput) -> bool;
}

/// Downcast one dependency result to the concrete type produced by the
/// provider at `index` of the goal's declared dependencies.
pub fn dep_data<'a, T: Send + Sync + 'static>(
    goal: &str,
    data: &'a [ProviderValue],
    index: usize,
) -> Result<&'a T, Error> {
    data.get(index)
        .and_then(|value| value.downcast_ref::<T>())
        .ok_or_else(|| {
            Error::Validation(format!("goal '{goal}' received unexpected data for dependency {index}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dep_data_downcasts() {
        let data: Vec<ProviderValue> = vec![Arc::new(41u32), Arc::new("s".to_string())];
        assert_eq!(*dep_data::<u32>("g", &data, 0).unwrap(), 41);
        assert_eq!(dep_data::<String>("g", &data, 1).unwrap(), "s");
    }

    #[test]
    fn test_dep_data_wrong_type_is_validation_error() {
        let data: Vec<ProviderValue> = vec![Arc::new(41u32)];
        let err = dep_data::<String>("net.minecraft", &data, 0).unwrap_err();
        assert!(err.to_string().contains("net.minecraft"));
    }

    #[test]
    fn test_dep_data_out_of_range() {
        let data: Vec<ProviderValue> = vec![];
        assert!(dep_data::<u32>("g", &data, 0).is_err());
    }
}
