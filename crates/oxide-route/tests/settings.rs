//! Tests for settings inheritance across groups and routes.

use oxide_route::{Method, Route, RouteGroup, RouteSettings, Target};
use serde_json::json;

fn target() -> Target {
    Target::function(|_| Ok(json!(null)))
}

#[test]
fn merge_with_empty_parent_is_noop() {
    let own = RouteSettings::new()
        .namespace("App")
        .method(Method::Get)
        .constraint("id", "[0-9]+")
        .parameter("page", "1")
        .middleware("C");
    assert_eq!(own.merge(&RouteSettings::new()), own);
}

#[test]
fn middleware_order_parent_first() {
    let parent = RouteSettings::new().middleware("A").middleware("B");
    let own = RouteSettings::new().middleware("C");
    let merged = own.merge(&parent);
    assert_eq!(merged.middleware, ["A", "B", "C"]);
    assert_eq!(merged.merge(&parent), merged);
}

#[test]
fn group_constraints_reach_compiled_pattern() {
    let group = RouteGroup::new("/items").constraint("id", "[0-9]+");
    let route = group
        .apply(Route::new("/{id}", target()))
        .compile()
        .unwrap();

    assert!(route.match_path("/items/abc").unwrap().is_none());
    assert!(route.match_path("/items/12").unwrap().is_some());
}

#[test]
fn route_constraint_wins_over_group() {
    let group = RouteGroup::new("").constraint("id", "[0-9]+");
    let route = group
        .apply(Route::new("/tag/{id}", target()).constraint("id", "[a-z]+"))
        .compile()
        .unwrap();

    assert!(route.match_path("/tag/rust").unwrap().is_some());
    assert!(route.match_path("/tag/12").unwrap().is_none());
}

#[test]
fn empty_group_contributes_nothing() {
    let route = Route::new("/x", target())
        .namespace("Own")
        .middleware("m");
    let before = route.settings().clone();
    let after = RouteGroup::default().apply(route);
    assert_eq!(after.settings(), &before);
}

#[test]
fn replacement_drops_inherited_methods() {
    let mut route = RouteGroup::new("/api")
        .method(Method::Get)
        .method(Method::Post)
        .apply(Route::new("/ping", target()));
    route.settings_mut().replace_methods([Method::Head]);
    let route = route.compile().unwrap();

    assert!(route.accepts(Method::Head));
    assert!(!route.accepts(Method::Get));
}

#[test]
fn group_tree_from_json() {
    let outer: RouteGroup = serde_json::from_value(json!({
        "prefix": "/api",
        "settings": { "namespace": "App\\Api", "middleware": ["auth"] }
    }))
    .unwrap();
    let inner: RouteGroup = serde_json::from_value(json!({
        "prefix": "/v2",
        "settings": { "methods": ["GET"], "where": { "id": "[0-9]+" } }
    }))
    .unwrap();

    let inner = outer.nest(inner);
    assert_eq!(
        serde_json::to_value(inner.export()).unwrap(),
        json!({
            "namespace": "App\\Api",
            "methods": ["GET"],
            "where": { "id": "[0-9]+" },
            "middleware": ["auth"]
        })
    );
}
