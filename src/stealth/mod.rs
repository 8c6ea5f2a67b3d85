//! Anti-detection page instrumentation
//!
//! Injects evasion scripts before any document script runs, masking the
//! automation markers headless Chromium leaks (webdriver flag, missing
//! plugins, WebGL strings, headless user agent).
//!
//! Whether instrumentation runs at all is decided once at startup from
//! config. If injection errors at runtime the capability is disabled for
//! the remainder of the process lifetime: a browser that half-applied
//! evasions is worse than one that never tried, and retrying a broken
//! CDP path on every launch only adds latency.

mod config;

pub use config::StealthProfile;

use anyhow::Result;
use chromiumoxide::{Page, cdp};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Set once injection has failed; never cleared for the process lifetime
static DISABLED: AtomicBool = AtomicBool::new(false);

/// Whether instrumentation is still available in this process
#[must_use]
pub fn is_available() -> bool {
    !DISABLED.load(Ordering::Relaxed)
}

/// Permanently disable instrumentation for this process
pub fn disable_for_process(reason: &str) {
    if !DISABLED.swap(true, Ordering::Relaxed) {
        warn!("Stealth instrumentation disabled for process lifetime: {reason}");
    }
}

// Order matters: proxied prototypes must exist before scripts that read them
const EVASION_SCRIPTS: &[(&str, &str)] = &[
    ("navigator_webdriver", NAVIGATOR_WEBDRIVER_JS),
    ("navigator_vendor", NAVIGATOR_VENDOR_JS),
    ("navigator_languages", NAVIGATOR_LANGUAGES_JS),
    ("navigator_plugins", NAVIGATOR_PLUGINS_JS),
    ("hardware_concurrency", HARDWARE_CONCURRENCY_JS),
    ("webgl_vendor_override", WEBGL_VENDOR_JS),
    ("chrome_runtime", CHROME_RUNTIME_JS),
];

const NAVIGATOR_WEBDRIVER_JS: &str = r"
    Object.defineProperty(navigator, 'webdriver', {
        get: () => false
    });
";

const NAVIGATOR_VENDOR_JS: &str = r"
    Object.defineProperty(navigator, 'vendor', {
        get: () => 'Google Inc.'
    });
";

const NAVIGATOR_LANGUAGES_JS: &str = r"
    Object.defineProperty(navigator, 'languages', {
        get: () => window.__fwProfile.languages
    });
";

const NAVIGATOR_PLUGINS_JS: &str = r"
    const mockPlugins = [
        {
            name: 'Chrome PDF Plugin',
            description: 'Portable Document Format',
            filename: 'internal-pdf-viewer',
            mimeTypes: [{ type: 'application/pdf', description: 'Portable Document Format' }]
        },
        {
            name: 'Chrome PDF Viewer',
            description: '',
            filename: 'mhjfbmdgcfjbbpaeojofohoefgiehjai',
            mimeTypes: [{ type: 'application/pdf', description: 'Portable Document Format' }]
        },
        {
            name: 'Native Client',
            description: '',
            filename: 'internal-nacl-plugin',
            mimeTypes: []
        }
    ];

    const pluginsProto = Object.getPrototypeOf(navigator.plugins);
    Object.defineProperty(navigator, 'plugins', {
        get: () => {
            const plugins = {};
            mockPlugins.forEach((plugin, i) => {
                plugins[i] = plugin;
                plugins[plugin.name] = plugin;
            });
            Object.setPrototypeOf(plugins, pluginsProto);
            Object.defineProperty(plugins, 'length', { value: mockPlugins.length });
            return plugins;
        }
    });
";

const HARDWARE_CONCURRENCY_JS: &str = r"
    Object.defineProperty(navigator, 'hardwareConcurrency', {
        get: () => window.__fwProfile.hardwareConcurrency
    });
";

const WEBGL_VENDOR_JS: &str = r"
    const getParameterProxyHandler = {
        apply: function(target, ctx, args) {
            const param = (args && args[0]) || null;

            // UNMASKED_VENDOR_WEBGL
            if (param === 37445) {
                return window.__fwProfile.webglVendor;
            }
            // UNMASKED_RENDERER_WEBGL
            if (param === 37446) {
                return window.__fwProfile.webglRenderer;
            }

            return Reflect.apply(target, ctx, args);
        }
    };

    if (window.WebGLRenderingContext) {
        const getParameter = WebGLRenderingContext.prototype.getParameter;
        WebGLRenderingContext.prototype.getParameter = new Proxy(getParameter, getParameterProxyHandler);
    }
";

const CHROME_RUNTIME_JS: &str = r"
    if (!window.chrome) {
        window.chrome = {};
    }

    if (!window.chrome.runtime) {
        window.chrome.runtime = {
            connect: () => ({
                onMessage: { addListener: () => {}, removeListener: () => {} },
                postMessage: () => {}
            })
        };
    }
";

/// Inject the evasion scripts into a page
///
/// Scripts are registered to evaluate on every new document, so they run
/// before any site script on each navigation. Fails only if no script at
/// all could be injected.
pub async fn inject(page: &Page) -> Result<()> {
    let profile = StealthProfile::default();

    // Per-session seed keeps any fingerprint surface stable within a
    // session but distinct across sessions
    let session_seed: Vec<u8> = (0..16).map(|_| rand::random::<u8>()).collect();

    let profile_js = format!(
        r#"
        window.__fwProfile = {{
            platform: "{}",
            languages: {},
            webglVendor: "{}",
            webglRenderer: "{}",
            hardwareConcurrency: {},
            sessionSeed: "{}"
        }};
        "#,
        profile.platform,
        serde_json::to_string(&profile.languages).unwrap_or_else(|_| "[]".to_string()),
        profile.webgl_vendor,
        profile.webgl_renderer,
        profile.hardware_concurrency,
        hex::encode(&session_seed),
    );

    debug!("Injecting stealth profile");
    page.execute(
        cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams {
            source: profile_js,
            include_command_line_api: None,
            world_name: None,
            run_immediately: None,
        },
    )
    .await?;

    let mut success_count = 0usize;
    let mut failed: Vec<&str> = Vec::new();

    for (name, source) in EVASION_SCRIPTS {
        let result = page
            .execute(
                cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams {
                    source: (*source).to_string(),
                    include_command_line_api: None,
                    world_name: None,
                    run_immediately: None,
                },
            )
            .await;

        match result {
            Ok(_) => success_count += 1,
            Err(e) => {
                warn!("Failed to inject {name}: {e}");
                failed.push(name);
            }
        }
    }

    if success_count == 0 {
        return Err(anyhow::anyhow!(
            "Failed to inject any stealth scripts ({} failures)",
            failed.len()
        ));
    }

    // User agent last: strip the Headless marker and pin accept-language
    let ua = page
        .execute(cdp::browser_protocol::browser::GetVersionParams {})
        .await?;

    let modified_ua = ua.user_agent.replace("Headless", "");

    page.execute(cdp::browser_protocol::network::SetUserAgentOverrideParams {
        user_agent: modified_ua,
        accept_language: Some(profile.accept_language.clone()),
        platform: Some(profile.platform.clone()),
        user_agent_metadata: None,
    })
    .await?;

    debug!(
        "Stealth injection complete: {}/{} scripts active",
        success_count,
        EVASION_SCRIPTS.len()
    );
    Ok(())
}
