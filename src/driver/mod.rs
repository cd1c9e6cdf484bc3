//! # Driver Module
//!
//! The privileged path: bind the PowerShell and republish its reports on a
//! virtual joystick.
//!
//! This module handles:
//! - Probe/teardown lifecycle of one bound device
//! - The driver registry (name, id table, current binding)
//! - The async loop feeding transport reports into the registry

pub mod controller;
pub mod registry;
pub mod event_loop;
