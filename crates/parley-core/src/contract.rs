//! These values are configured on the dialogue agent side as well and must
//! match it byte for byte.

/// Name of the tool the agent invokes to hand over the collected profile.
pub const PROFILE_TOOL_NAME: &str = "user-details";

/// Opening delimiter of a structured summary block in agent speech.
pub const SUMMARY_START: &str = "---STRUCTURED_SUMMARY_START---";

/// Closing delimiter of a structured summary block in agent speech.
pub const SUMMARY_END: &str = "---STRUCTURED_SUMMARY_END---";
