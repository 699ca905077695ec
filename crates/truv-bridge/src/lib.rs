// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Truv bridge — platform capability abstractions.
//
// The engine never touches a WebView, cookie jar, or network stack directly.
// Host applications implement the traits in `traits` on top of their
// platform's browser engine; `headless` is an in-memory implementation for
// desktop builds, replays, and tests.

pub mod headless;
pub mod traits;

pub use headless::{HeadlessBridge, HeadlessHttp, HeadlessSurface};
pub use traits::*;
