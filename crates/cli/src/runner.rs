//! Dependency-gated concurrent runner.
//!
//! Providers fan out as one task each; every completion bumps the
//! satisfied-dependency counter of the goals waiting on it, and a goal
//! runs exactly once, in the task of whichever provider satisfied its
//! last dependency. Output goes to one directory per goal plus a
//! top-level `index.json` written only after every goal finished.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{join_all, try_join_all};
use metagen_client::{CachedClient, ClientOptions, Goal, Provider, ProviderValue};
use metagen_core::cache::hash::sha256_hex;
use metagen_core::format::{
    FORMAT_VERSION, IndexFile, IndexPackage, PackageIndex, PackageIndexVersion, VersionFile,
    VersionOutput,
};
use metagen_core::{AppConfig, Error};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

/// Run `goals` and every provider they depend on.
pub async fn build(goals: Vec<Arc<dyn Goal>>, config: &AppConfig) -> Result<(), Error> {
    let mut providers: BTreeMap<String, Arc<dyn Provider>> = BTreeMap::new();
    let mut dependents: HashMap<String, Vec<Arc<dyn Goal>>> = HashMap::new();

    let mut seen = std::collections::HashSet::new();
    for goal in goals {
        if !seen.insert(goal.id()) {
            continue;
        }
        for dep in goal.deps() {
            providers.insert(dep.id().to_string(), dep.clone());
            dependents.entry(dep.id().to_string()).or_default().push(goal.clone());
        }
    }

    run(providers, dependents, config).await
}

/// Run `providers` on their own, warming the cache without generating
/// any output.
pub async fn prepare(providers: Vec<Arc<dyn Provider>>, config: &AppConfig) -> Result<(), Error> {
    let providers: BTreeMap<String, Arc<dyn Provider>> =
        providers.into_iter().map(|p| (p.id().to_string(), p)).collect();
    run(providers, HashMap::new(), config).await
}

#[derive(Default)]
struct RunState {
    results: HashMap<String, ProviderValue>,
    satisfied: HashMap<&'static str, usize>,
    completed: Vec<IndexPackage>,
}

async fn run(
    providers: BTreeMap<String, Arc<dyn Provider>>,
    mut dependents: HashMap<String, Vec<Arc<dyn Goal>>>,
    config: &AppConfig,
) -> Result<(), Error> {
    let started = Instant::now();
    let provider_count = providers.len();
    let state = Arc::new(Mutex::new(RunState::default()));

    let mut tasks = JoinSet::new();
    for (id, provider) in providers {
        let dependents = dependents.remove(&id).unwrap_or_default();
        let state = state.clone();
        let config = config.clone();
        tasks.spawn(async move { run_provider(provider, dependents, state, config).await });
    }

    let mut first_error: Option<Error> = None;
    while let Some(joined) = tasks.join_next().await {
        let result = joined.unwrap_or_else(|err| Err(Error::Task(err.to_string())));
        if let Err(err) = result {
            tracing::error!("{err}");
            first_error.get_or_insert(err);
        }
    }
    if let Some(err) = first_error {
        return Err(err);
    }

    let state = state.lock().await;
    let mut packages = state.completed.clone();
    packages.sort_by(|a, b| a.uid.cmp(&b.uid));
    let goal_count = packages.len();

    if goal_count > 0 {
        let index = IndexFile { format_version: FORMAT_VERSION, packages };
        let path = config.output_dir.join("index.json");
        write_file(&path, &serde_json::to_vec_pretty(&index)?).await?;
        tracing::debug!("wrote '{}'", path.display());
    }

    tracing::info!(
        providers = provider_count,
        goals = goal_count,
        "finished in {}",
        format_elapsed(started.elapsed())
    );
    Ok(())
}

async fn run_provider(
    provider: Arc<dyn Provider>,
    dependents: Vec<Arc<dyn Goal>>,
    state: Arc<Mutex<RunState>>,
    config: AppConfig,
) -> Result<(), Error> {
    let id = provider.id();
    tracing::info!("running provider '{id}'");
    let client = CachedClient::new(ClientOptions {
        user_agent: config.user_agent.clone(),
        dir: config.cache_dir.join(id),
        assume_up_to_date: config.assume_up_to_date,
    })?;
    let value = provider.provide(&client).await?;
    tracing::info!("got data from provider '{id}'");

    // Under the lock: store the result and collect every goal whose
    // last dependency this completion satisfied. The goals themselves
    // run after the lock is released.
    let ready = {
        let mut state = state.lock().await;
        state.results.insert(id.to_string(), value);

        let mut ready = Vec::new();
        for goal in dependents {
            let declared = goal.deps().len();
            let satisfied = state.satisfied.entry(goal.id()).or_insert(0);
            *satisfied += 1;
            if *satisfied > declared {
                return Err(Error::DependencyOverflow { goal: goal.id().to_string(), declared });
            }
            if *satisfied == declared {
                let data = goal
                    .deps()
                    .iter()
                    .map(|dep| {
                        state.results.get(dep.id()).cloned().ok_or_else(|| {
                            Error::Task(format!("result of provider '{}' vanished", dep.id()))
                        })
                    })
                    .collect::<Result<Vec<ProviderValue>, Error>>()?;
                ready.push((goal, data));
            }
        }
        ready
    };

    // Every ready goal runs to completion; one goal failing must not
    // cancel a sibling that became runnable on the same completion.
    let outcomes = join_all(ready.into_iter().map(|(goal, data)| {
        let state = state.clone();
        let config = config.clone();
        async move {
            tracing::info!("running goal '{}'", goal.id());
            let package = run_goal(goal.as_ref(), &data, &config).await?;
            state.lock().await.completed.push(package);
            tracing::info!("finished goal '{}'", goal.id());
            Ok::<_, Error>(())
        }
    }))
    .await;

    let mut first_error: Option<Error> = None;
    for outcome in outcomes {
        if let Err(err) = outcome {
            match first_error {
                None => first_error = Some(err),
                Some(_) => tracing::error!("{err}"),
            }
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

async fn run_goal(goal: &dyn Goal, data: &[ProviderValue], config: &AppConfig) -> Result<IndexPackage, Error> {
    let outputs = goal.generate(data)?;
    let dir = config.output_dir.join(goal.id());

    // Validate every version id before the first write so a bad record
    // cannot leave a partially materialized package behind.
    let records: Vec<(PathBuf, VersionOutput, bool)> = {
        let mut first = true;
        outputs
            .into_iter()
            .map(|output| {
                let path = record_path(&dir, &output.version)?;
                let recommended = goal.recommend(first, &output);
                if recommended {
                    first = false;
                }
                Ok((path, output, recommended))
            })
            .collect::<Result<_, Error>>()?
    };

    tokio::fs::create_dir_all(&dir).await.map_err(|err| Error::output_io(&dir, err))?;

    let versions = try_join_all(records.into_iter().map(|(path, output, recommended)| async move {
        let file = VersionFile::new(goal.id(), goal.name(), output);
        let data = serialize(&file, config.minify)?;
        write_file(&path, &data).await?;
        let sha256 = sha256_hex(&data);
        tracing::debug!("wrote '{}' ({sha256})", path.display());

        Ok::<_, Error>(PackageIndexVersion {
            version: file.output.version,
            release_time: file.output.release_time,
            kind: file.output.kind,
            requires: file.output.requires,
            conflicts: file.output.conflicts,
            recommended,
            sha256,
        })
    }))
    .await?;

    // The package index is written last so it never references a record
    // that failed to materialize. Index files stay pretty regardless of
    // the minify setting.
    let index = PackageIndex {
        uid: goal.id().to_string(),
        name: goal.name().to_string(),
        format_version: FORMAT_VERSION,
        versions,
    };
    let index_data = serde_json::to_vec_pretty(&index)?;
    let index_path = dir.join("index.json");
    write_file(&index_path, &index_data).await?;
    let sha256 = sha256_hex(&index_data);
    tracing::debug!("wrote '{}' ({sha256})", index_path.display());

    Ok(IndexPackage { uid: goal.id().to_string(), name: goal.name().to_string(), sha256 })
}

fn serialize<T: serde::Serialize>(value: &T, minify: bool) -> Result<Vec<u8>, Error> {
    Ok(if minify { serde_json::to_vec(value)? } else { serde_json::to_vec_pretty(value)? })
}

async fn write_file(path: &Path, data: &[u8]) -> Result<(), Error> {
    tokio::fs::write(path, data).await.map_err(|err| Error::output_io(path, err))
}

/// A version id doubles as a file name, so anything that could name a
/// different path, or collide with the package index, is rejected
/// outright rather than sanitized.
fn record_path(dir: &Path, version: &str) -> Result<PathBuf, Error> {
    let unsafe_id = version.is_empty()
        || version == "index"
        || version == "."
        || version == ".."
        || version.contains('/')
        || version.contains('\\')
        || version.contains('\0');
    if unsafe_id {
        return Err(Error::UnsafeVersionId(version.to_string()));
    }

    let path = dir.join(format!("{version}.json"));
    if path.parent() != Some(dir) {
        return Err(Error::UnsafeVersionId(version.to_string()));
    }
    Ok(path)
}

fn format_elapsed(elapsed: Duration) -> String {
    if elapsed < Duration::from_secs(1) {
        format!("{}ms", elapsed.as_millis())
    } else {
        format!("{:.3}s", elapsed.as_secs_f64())
    }
}
