// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Undine-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Undine and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

pub mod flow {
    use std::fmt::Write as _;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Case {
        Small,
        MediumFan,
        LargeChain,
        LongLabels,
    }

    impl Case {
        pub fn id(&self) -> &'static str {
            match self {
                Self::Small => "small",
                Self::MediumFan => "medium_fan",
                Self::LargeChain => "large_chain",
                Self::LongLabels => "long_labels",
            }
        }
    }

    pub fn fixture(case: Case) -> String {
        match case {
            Case::Small => "flowchart LR\nA[task.start]\nA-->|spec.start|B[writer]\n".to_owned(),
            Case::MediumFan => {
                let mut src = String::from("flowchart LR\n");
                for worker in 0..6 {
                    let _ = writeln!(src, "hub -->|job{worker}| w{worker}");
                    let _ = writeln!(src, "w{worker} --> sink");
                }
                src
            }
            Case::LargeChain => {
                let mut src = String::from("flowchart LR\n");
                for i in 0..24 {
                    let _ = writeln!(src, "n{i} --> n{}", i + 1);
                }
                let _ = writeln!(src, "n24 --> n0");
                src
            }
            Case::LongLabels => {
                let mut src = String::from("flowchart TD\n");
                for i in 0..8 {
                    let _ = writeln!(
                        src,
                        "s{i}[stage {i} with a deliberately long label text] -->|hand over to the next stage| s{}",
                        i + 1
                    );
                }
                src
            }
        }
    }
}

/// Cheap, stable digest so benchmark results depend on real output.
pub fn checksum(text: &str) -> u64 {
    let mut acc = 0u64;
    for byte in text.bytes() {
        acc = acc.wrapping_mul(131).wrapping_add(u64::from(byte));
    }
    acc
}
