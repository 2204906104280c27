//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for Spec Orchestrator,
//! including process spawning, file system artifacts, and i18n support.
//!
//! 此模块为 Spec Orchestrator 提供基础设施服务，
//! 包括进程派生、文件系统产物和国际化支持。

pub mod command;
pub mod fs;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
