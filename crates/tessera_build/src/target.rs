//! Mapping a resolved target onto its cache.

use tessera_cache::{
    AssociatedPolicy, Cache, CacheError, EntryPointPolicy, GlobalKeys, InvalidationPolicy, LoadOptions,
    PlainPolicy,
};
use tessera_config::{ResolvedTarget, TargetKind};

/// Returns the global invalidation keys of a build of `target`.
pub fn global_keys(target: &ResolvedTarget) -> GlobalKeys {
    GlobalKeys {
        compact: target.build.compact,
        version: target.version.clone(),
        commit: target.build.commit.clone(),
        defines: target.defines.clone(),
        entry_points: target.entry_points.iter().cloned().collect(),
        pixel_density: target.build.pixel_density,
        css_urls: target.build.css_urls.clone(),
        js_urls: target.build.js_urls.clone(),
    }
}

/// Returns the invalidation policy for `target`'s kind.
///
/// Scripts expose named entry points, views are paired with their
/// controlling scripts, and everything else uses the plain policy.
pub fn policy_for(target: &ResolvedTarget) -> Box<dyn InvalidationPolicy> {
    match target.kind {
        TargetKind::Script => Box::new(EntryPointPolicy),
        TargetKind::Stylesheet | TargetKind::Shader => Box::new(PlainPolicy),
        TargetKind::View => {
            let policy = target
                .roots
                .iter()
                .filter_map(|root| Some((&root.source, association(root.controller.as_deref()?))))
                .fold(AssociatedPolicy::new(), |policy, (source, assoc)| {
                    policy.with_association(source.clone(), assoc)
                });
            Box::new(policy)
        }
    }
}

/// The association string recorded for a controller path.
pub fn association(controller: &std::path::Path) -> String {
    controller.to_string_lossy().into_owned()
}

/// Loads the cache of `target`.
pub fn load_cache(target: &ResolvedTarget) -> Result<Cache, CacheError> {
    let options = LoadOptions {
        cache_dir: target.cache_dir.clone(),
        target_output: target.output.clone(),
        keys: global_keys(target),
        force: target.build.force,
    };
    Cache::load(options, policy_for(target))
}
