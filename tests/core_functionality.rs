use radixmux::{Params, RouteOutcome, Router, RouterError, find_case_insensitive_path, find_route};
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn setup_tracing_for_tests() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE)
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::TRACE.into()))
        .with_test_writer()
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn router_with(routes: &[&'static str]) -> Router<&'static str> {
    let mut router = Router::new();
    for route in routes {
        router
            .get(route, *route)
            .unwrap_or_else(|e| panic!("failed to register '{route}': {e}"));
    }
    router
}

#[test]
fn test_static_routes() {
    setup_tracing_for_tests();
    let router = router_with(&[
        "/a",
        "/hi",
        "/contact",
        "/co",
        "/c",
        "/ab",
        "/doc/",
        "/doc/go_faq.html",
        "/doc/go1.html",
    ]);

    let mut params = Params::new();
    let found = router.lookup("GET", "/co", &mut params);
    assert_eq!(found.value, Some(&"/co"));
    assert!(params.is_empty());

    // "/con" matches nothing and no trailing-slash variant exists
    let missed = router.lookup("GET", "/con", &mut params);
    assert_eq!(missed.value, None);
    assert!(!missed.tsr);

    // "/doc/" is registered, so "/doc" carries the redirect hint
    let missed = router.lookup("GET", "/doc", &mut params);
    assert_eq!(missed.value, None);
    assert!(missed.tsr);

    router.check_priorities().unwrap();
    router.check_tree_invariants().unwrap();
}

#[test]
fn test_parameter_routes() {
    setup_tracing_for_tests();
    let router = router_with(&["/search/{query}", "/search/"]);

    let mut params = Params::new();
    let found = router.lookup("GET", "/search/foo", &mut params);
    assert_eq!(found.value, Some(&"/search/{query}"));
    assert_eq!(params.get("query"), Some("foo"));

    let found = router.lookup("GET", "/search/", &mut params);
    assert_eq!(found.value, Some(&"/search/"));
    assert!(params.is_empty());

    let missed = router.lookup("GET", "/search/foo/", &mut params);
    assert_eq!(missed.value, None);
    assert!(missed.tsr);

    // a parameter never matches an empty segment
    let router = router_with(&["/users/{id}"]);
    let mut params = Params::new();
    let missed = router.lookup("GET", "/users/", &mut params);
    assert_eq!(missed.value, None);
    assert!(!missed.tsr);
}

#[test]
fn test_catch_all_routes() {
    setup_tracing_for_tests();
    let router = router_with(&["/src/{filepath...}"]);

    let mut params = Params::new();
    let found = router.lookup("GET", "/src/", &mut params);
    assert_eq!(found.value, Some(&"/src/{filepath...}"));
    assert_eq!(params.get("filepath"), Some("/"));

    let found = router.lookup("GET", "/src/a/b.png", &mut params);
    assert_eq!(found.value, Some(&"/src/{filepath...}"));
    assert_eq!(params.get("filepath"), Some("/a/b.png"));

    // the catch-all claims "/src/", so "/src" is one slash away
    let missed = router.lookup("GET", "/src", &mut params);
    assert_eq!(missed.value, None);
    assert!(missed.tsr);
}

#[test]
fn test_param_with_literal_prefix() {
    setup_tracing_for_tests();
    let router = router_with(&["/user_{name}", "/user_{name}/about"]);

    let mut params = Params::new();
    let found = router.lookup("GET", "/user_gopher", &mut params);
    assert_eq!(found.value, Some(&"/user_{name}"));
    assert_eq!(params.get("name"), Some("gopher"));

    let found = router.lookup("GET", "/user_gopher/about", &mut params);
    assert_eq!(found.value, Some(&"/user_{name}/about"));
    assert_eq!(params.get("name"), Some("gopher"));
}

#[test]
fn test_catch_all_under_param() {
    setup_tracing_for_tests();
    let router = router_with(&["/files/{dir}/{filepath...}"]);

    let mut params = Params::new();
    let found = router.lookup("GET", "/files/js/inc/framework.js", &mut params);
    assert_eq!(found.value, Some(&"/files/{dir}/{filepath...}"));
    assert_eq!(params.get("dir"), Some("js"));
    assert_eq!(params.get("filepath"), Some("/inc/framework.js"));

    // "/files/js/" matches the catch-all with "/"
    let found = router.lookup("GET", "/files/js/", &mut params);
    assert_eq!(found.value, Some(&"/files/{dir}/{filepath...}"));
    assert_eq!(params.get("filepath"), Some("/"));

    // "/files/js" is one slash short of the catch-all
    let missed = router.lookup("GET", "/files/js", &mut params);
    assert_eq!(missed.value, None);
    assert!(missed.tsr);
}

#[test]
fn test_registration_errors() {
    setup_tracing_for_tests();

    let mut router = Router::new();
    router.get("/home", "h").unwrap();
    assert!(matches!(
        router.get("/home", "h2"),
        Err(RouterError::DuplicateRoute { existing, .. }) if existing == "/home"
    ));

    let mut router = Router::new();
    router.get("/{a}", "wild").unwrap();
    assert!(matches!(
        router.get("/x", "static"),
        Err(RouterError::ChildConflict { existing, .. }) if existing == "/{a}"
    ));
    assert!(matches!(
        router.get("/{b}", "other"),
        Err(RouterError::WildcardConflict { existing, .. }) if existing == "/{a}"
    ));

    let mut router = Router::new();
    router.get("/cmd/{tool}", "tool").unwrap();
    assert!(matches!(
        router.get("/cmd/vet", "vet"),
        Err(RouterError::ChildConflict { .. })
    ));

    let mut router = Router::new();
    router.get("/src/{filepath...}", "files").unwrap();
    assert!(matches!(
        router.get("/src/", "dir"),
        Err(RouterError::ChildConflict { .. })
    ));
    assert!(matches!(
        router.get("/src/{other...}", "other"),
        Err(RouterError::WildcardConflict { .. })
    ));
    assert!(matches!(
        router.get("/src/{filepath...}", "again"),
        Err(RouterError::DuplicateRoute { .. })
    ));

    let mut router = Router::<&str>::new();
    assert!(matches!(
        router.get("/files/{p...}/x", "h"),
        Err(RouterError::CatchAllNotTerminal { .. })
    ));
    assert!(matches!(
        router.get("/files_{p...}", "h"),
        Err(RouterError::CatchAllNotTerminal { .. })
    ));
    assert!(matches!(
        router.get("/x/{}", "h"),
        Err(RouterError::UnnamedWildcard { .. })
    ));
    assert!(matches!(
        router.get("/x/{a}{b}", "h"),
        Err(RouterError::InvalidWildcard { segment, .. }) if segment == "{a}{b}"
    ));
    assert!(matches!(
        router.get("no-slash", "h"),
        Err(RouterError::MalformedPath { .. })
    ));
    assert!(matches!(
        router.handle("", "/x", "h"),
        Err(RouterError::EmptyMethod { .. })
    ));
}

const ROUND_TRIP_ROUTES: &[&str] = &[
    "/",
    "/cmd/{tool}/{sub}",
    "/cmd/{tool}/",
    "/src/{filepath...}",
    "/search/",
    "/search/{query}",
    "/user_{name}",
    "/user_{name}/about",
    "/files/{dir}/{filepath...}",
    "/doc/",
    "/doc/go_faq.html",
    "/doc/go1.html",
    "/info/{user}/public",
    "/info/{user}/project/{project}",
];

#[test]
fn test_round_trip_laws() {
    setup_tracing_for_tests();
    let router = router_with(ROUND_TRIP_ROUTES);

    router.check_priorities().unwrap();
    router.check_tree_invariants().unwrap();

    for route in ROUND_TRIP_ROUTES {
        // every registered route resolves to its own handler, without a hint
        let mut params = Params::new();
        let found = router.lookup("GET", route, &mut params);
        assert_eq!(found.value, Some(route), "lookup of '{route}'");

        // and repairs to itself, with and without trailing-slash fixing
        assert_eq!(
            find_case_insensitive_path(&router, "GET", route, false).as_deref(),
            Some(*route),
            "repair of '{route}'"
        );
        assert_eq!(
            find_case_insensitive_path(&router, "GET", route, true).as_deref(),
            Some(*route)
        );
    }

    let mut params = Params::new();
    let found = router.lookup("GET", "/cmd/vet/check", &mut params);
    assert_eq!(found.value, Some(&"/cmd/{tool}/{sub}"));
    assert_eq!(params.get("tool"), Some("vet"));
    assert_eq!(params.get("sub"), Some("check"));

    let found = router.lookup("GET", "/info/gordon/project/go", &mut params);
    assert_eq!(found.value, Some(&"/info/{user}/project/{project}"));
    assert_eq!(params.get("user"), Some("gordon"));
    assert_eq!(params.get("project"), Some("go"));
}

#[test]
fn test_case_insensitive_repair() {
    setup_tracing_for_tests();
    let router = router_with(&["/hi", "/b/", "/ABC/", "/search/{query}", "/doc/go1.html"]);

    assert_eq!(
        find_case_insensitive_path(&router, "GET", "/HI", false).as_deref(),
        Some("/hi")
    );
    assert_eq!(
        find_case_insensitive_path(&router, "GET", "/abc/", false).as_deref(),
        Some("/ABC/")
    );
    assert_eq!(
        find_case_insensitive_path(&router, "GET", "/DOC/GO1.HTML", false).as_deref(),
        Some("/doc/go1.html")
    );
    // wildcard values are taken verbatim
    assert_eq!(
        find_case_insensitive_path(&router, "GET", "/SEARCH/QuErY", false).as_deref(),
        Some("/search/QuErY")
    );

    // trailing-slash fixing is opt-in
    assert_eq!(find_case_insensitive_path(&router, "GET", "/HI/", false), None);
    assert_eq!(
        find_case_insensitive_path(&router, "GET", "/HI/", true).as_deref(),
        Some("/hi")
    );
    assert_eq!(find_case_insensitive_path(&router, "GET", "/B", false), None);
    assert_eq!(
        find_case_insensitive_path(&router, "GET", "/B", true).as_deref(),
        Some("/b/")
    );

    assert_eq!(find_case_insensitive_path(&router, "GET", "/missing", true), None);
}

#[test]
fn test_unicode_repair() {
    setup_tracing_for_tests();
    let router = router_with(&["/darüber", "/σελίδα", "/straße"]);

    assert_eq!(
        find_case_insensitive_path(&router, "GET", "/DARÜBER", false).as_deref(),
        Some("/darüber")
    );
    assert_eq!(
        find_case_insensitive_path(&router, "GET", "/ΣΕΛΊΔΑ", false).as_deref(),
        Some("/σελίδα")
    );
    assert_eq!(
        find_case_insensitive_path(&router, "GET", "/STRAßE", false).as_deref(),
        Some("/straße")
    );
}

#[test]
fn test_repair_does_not_invent_tsr() {
    setup_tracing_for_tests();
    let router = router_with(&["/{x}"]);

    // "/" when only "/{x}" exists: no repair, no redirect hint
    assert_eq!(find_case_insensitive_path(&router, "GET", "/", true), None);

    let mut params = Params::new();
    let missed = router.lookup("GET", "/", &mut params);
    assert_eq!(missed.value, None);
    assert!(!missed.tsr);
}

#[test]
fn test_lookup_without_capture() {
    setup_tracing_for_tests();
    let router = router_with(&["/users/{id}/posts/{post}"]);

    let found = find_route(&router, "GET", "/users/1/posts/2", None);
    assert_eq!(found.value, Some(&"/users/{id}/posts/{post}"));

    let missed = find_route(&router, "PUT", "/users/1/posts/2", None);
    assert_eq!(missed.value, None);
    assert!(!missed.tsr);
}

#[test]
fn test_trailing_slash_redirects() {
    setup_tracing_for_tests();
    let mut router = Router::new();
    router.get("/doc/", "doc").unwrap();
    router.get("/x", "x").unwrap();
    router.post("/p/", "p").unwrap();

    match router.route("GET", "/doc") {
        RouteOutcome::Redirect { location, code } => {
            assert_eq!((location.as_str(), code), ("/doc/", 301));
        }
        outcome => panic!("expected redirect, got {outcome:?}"),
    }

    match router.route("GET", "/x/") {
        RouteOutcome::Redirect { location, code } => {
            assert_eq!((location.as_str(), code), ("/x", 301));
        }
        outcome => panic!("expected redirect, got {outcome:?}"),
    }

    // non-GET methods keep their method and body
    match router.route("POST", "/p") {
        RouteOutcome::Redirect { location, code } => {
            assert_eq!((location.as_str(), code), ("/p/", 308));
        }
        outcome => panic!("expected redirect, got {outcome:?}"),
    }

    // redirects can be switched off
    router.redirect_trailing_slash = false;
    router.redirect_fixed_path = false;
    assert!(matches!(
        router.route("GET", "/doc"),
        RouteOutcome::NotFound { .. }
    ));
}

#[test]
fn test_fixed_path_redirects() {
    setup_tracing_for_tests();
    let mut router = Router::new();
    router.get("/path", "path").unwrap();

    match router.route("GET", "/PATH") {
        RouteOutcome::Redirect { location, code } => {
            assert_eq!((location.as_str(), code), ("/path", 301));
        }
        outcome => panic!("expected redirect, got {outcome:?}"),
    }

    // superfluous elements are cleaned before the case-insensitive lookup
    match router.route("GET", "/..//Path") {
        RouteOutcome::Redirect { location, .. } => assert_eq!(location, "/path"),
        outcome => panic!("expected redirect, got {outcome:?}"),
    }

    router.redirect_fixed_path = false;
    assert!(matches!(
        router.route("GET", "/PATH"),
        RouteOutcome::NotFound { .. }
    ));
}

#[test]
fn test_connect_and_root_never_redirect() {
    setup_tracing_for_tests();
    let mut router = Router::new();
    router.handle("CONNECT", "/c", "c").unwrap();
    router.get("/root/", "root").unwrap();

    assert!(matches!(
        router.route("CONNECT", "/c/"),
        RouteOutcome::NotFound { .. }
    ));
    assert!(matches!(
        router.route("GET", "/"),
        RouteOutcome::NotFound { .. }
    ));
}

#[test]
fn test_automatic_options() {
    setup_tracing_for_tests();
    let mut router = Router::new();
    router.get("/handle", "get").unwrap();
    router.post("/handle", "post").unwrap();

    match router.route("OPTIONS", "/handle") {
        RouteOutcome::AutoOptions { allow, handler } => {
            assert_eq!(allow, "GET, OPTIONS, POST");
            assert!(handler.is_none());
        }
        outcome => panic!("expected automatic OPTIONS, got {outcome:?}"),
    }

    router.global_options = Some("global-options");
    match router.route("OPTIONS", "/handle") {
        RouteOutcome::AutoOptions { handler, .. } => {
            assert_eq!(handler, Some(&"global-options"));
        }
        outcome => panic!("expected automatic OPTIONS, got {outcome:?}"),
    }

    // a path no method routes yields not-found, not an empty Allow header
    assert!(matches!(
        router.route("OPTIONS", "/nowhere"),
        RouteOutcome::NotFound { .. }
    ));

    assert_eq!(router.allowed_methods("*", "OPTIONS"), "GET, OPTIONS, POST");
}

#[test]
fn test_method_not_allowed() {
    setup_tracing_for_tests();
    let mut router = Router::new();
    router.get("/handle", "get").unwrap();
    router.post("/handle", "post").unwrap();

    match router.route("DELETE", "/handle") {
        RouteOutcome::MethodNotAllowed { allow, handler } => {
            assert_eq!(allow, "GET, OPTIONS, POST");
            assert!(handler.is_none());
        }
        outcome => panic!("expected 405, got {outcome:?}"),
    }

    router.method_not_allowed = Some("custom-405");
    match router.route("DELETE", "/handle") {
        RouteOutcome::MethodNotAllowed { handler, .. } => {
            assert_eq!(handler, Some(&"custom-405"));
        }
        outcome => panic!("expected 405, got {outcome:?}"),
    }

    router.handle_method_not_allowed = false;
    router.not_found = Some("custom-404");
    match router.route("DELETE", "/handle") {
        RouteOutcome::NotFound { handler } => assert_eq!(handler, Some(&"custom-404")),
        outcome => panic!("expected not-found, got {outcome:?}"),
    }
}

#[test]
fn test_matched_route_path() {
    setup_tracing_for_tests();
    let mut router = Router::new();
    router.save_matched_route_path = true;
    router.get("/users/{id}", "user").unwrap();

    match router.route("GET", "/users/7") {
        RouteOutcome::Match { value, params } => {
            assert_eq!(*value, "user");
            assert_eq!(params.get("id"), Some("7"));
            assert_eq!(params.matched_route_path(), Some("/users/{id}"));
        }
        outcome => panic!("expected match, got {outcome:?}"),
    }

    // recording is off by default
    let mut plain = Router::new();
    plain.get("/users/{id}", "user").unwrap();
    match plain.route("GET", "/users/7") {
        RouteOutcome::Match { params, .. } => {
            assert_eq!(params.matched_route_path(), None);
        }
        outcome => panic!("expected match, got {outcome:?}"),
    }
}

#[test]
fn test_routes_listing() {
    setup_tracing_for_tests();
    let mut router = Router::new();
    router.get("/a", "a").unwrap();
    router.post("/b", "b").unwrap();

    let routes: Vec<(&str, &str)> = router.routes().collect();
    assert_eq!(routes, vec![("GET", "/a"), ("POST", "/b")]);
}
