//! Fixed demo traffic for previewing the dump and report without a proxy

use crate::allowlist::HostAllowList;
use crate::config::ReportConfig;
use crate::observer::{ObservationHook, RequestObserver};
use crate::registry::PathRegistry;
use std::path::PathBuf;
use std::sync::Arc;

pub const SAMPLE_DUMP_FILE: &str = "test_sites_dump.json";
pub const SAMPLE_REPORT_FILE: &str = "test_sites_report.html";

const SAMPLE_TRAFFIC: &[(&str, &[&str])] = &[
    (
        "google.com:443",
        &[
            "/search?q=test",
            "/maps/api/geocode/json",
            "/apis/oauth2/v1/tokeninfo",
            "/apis/calendar/v3/calendars",
            "/apis/drive/v3/files",
            "/apis/gmail/v1/users/me/messages",
        ],
    ),
    (
        "api.github.com:443",
        &[
            "/api/v3/user",
            "/api/v3/repos/owner/repo/commits",
            "/api/v3/repos/owner/repo/issues",
            "/api/v3/repos/owner/repo/pulls",
            "/api/v3/repos/owner/repo/contents/README.md",
            "/api/v3/repos/owner/repo/branches",
            "/api/v3/repos/owner/repo/releases",
            "/api/v3/repos/owner/repo/actions/runs",
        ],
    ),
    (
        "aws.amazon.com:443",
        &[
            "/s3/bucket-name/file.txt",
            "/ec2/instances/i-1234567890abcdef0",
            "/lambda/functions/my-function",
            "/dynamodb/tables/my-table",
            "/cloudformation/stacks/my-stack",
            "/rds/db-instances/my-database",
        ],
    ),
    (
        "192.168.1.10:8080",
        &[
            "/api/v1/users",
            "/api/v1/users/123",
            "/api/v1/users/123/profile",
            "/api/v1/users/123/settings",
            "/api/v1/auth/login",
            "/api/v1/auth/logout",
            "/api/v1/auth/refresh",
            "/api/v1/data/analytics",
            "/api/v1/data/reports",
            "/api/v1/data/export",
        ],
    ),
    (
        "cdn.example.com:443",
        &[
            "/static/js/app.js",
            "/static/css/styles.css",
            "/static/images/logo.png",
            "/static/images/banner.jpg",
            "/static/fonts/roboto.woff2",
            "/static/videos/demo.mp4",
        ],
    ),
    ("empty-host.com:80", &[]),
    (
        "httpbin.org:443",
        &["/get", "/status/200", "/json", "/headers", "/ip"],
    ),
];

/// Registry filled with the demo traffic, classified against `allow_list`
pub fn sample_registry(allow_list: Arc<HostAllowList>) -> Arc<PathRegistry> {
    let registry = Arc::new(PathRegistry::new());
    let observer = RequestObserver::new(allow_list, Arc::clone(&registry));

    for (host, paths) in SAMPLE_TRAFFIC {
        observer.on_tunnel(host);
        for path in *paths {
            observer.on_request(host, path);
        }
    }

    registry
}

/// Report settings for sample mode: same template, `test_` output files
pub fn sample_report_config(template: PathBuf) -> ReportConfig {
    ReportConfig {
        dump_file: PathBuf::from(SAMPLE_DUMP_FILE),
        report_file: PathBuf::from(SAMPLE_REPORT_FILE),
        template,
    }
}
