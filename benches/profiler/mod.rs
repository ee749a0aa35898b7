// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Undine-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Undine and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use criterion::Criterion;

use pprof::criterion::{Output, PProfProfiler};

fn sample_frequency() -> i32 {
    std::env::var("PROFILE_FREQ")
        .ok()
        .and_then(|raw| raw.trim().parse::<i32>().ok())
        .unwrap_or(100)
        .clamp(1, 1000)
}

pub fn criterion() -> Criterion {
    Criterion::default()
        .with_profiler(PProfProfiler::new(sample_frequency(), Output::Flamegraph(None)))
}
