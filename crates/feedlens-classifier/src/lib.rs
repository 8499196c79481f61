// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Topic classification for Feedlens.
//!
//! A small multinomial logistic-regression model: linear scoring over a
//! sentence embedding followed by a numerically stable softmax. Weights are
//! trained offline and loaded once per process; nothing here ever trains.

pub mod linear;
pub mod weights;

pub use linear::LinearClassifier;
pub use weights::ClassifierModel;
