use std::fmt;
use std::ops::BitOr;
use std::ops::BitOrAssign;

/// Typed capability set backed by the persisted privilege bitmask.
///
/// Bit positions are part of the storage format and must never move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Privileges(u64);

impl Privileges {
    pub const PUBLIC: Self = Self(1);
    pub const NORMAL: Self = Self(1 << 1);
    pub const DONOR: Self = Self(1 << 2);
    pub const ACCESS_RAP: Self = Self(1 << 3);
    pub const MANAGE_USERS: Self = Self(1 << 4);
    pub const BAN_USERS: Self = Self(1 << 5);
    pub const SILENCE_USERS: Self = Self(1 << 6);
    pub const WIPE_USERS: Self = Self(1 << 7);
    pub const MANAGE_BEATMAPS: Self = Self(1 << 8);
    pub const MANAGE_SERVERS: Self = Self(1 << 9);
    pub const MANAGE_SETTINGS: Self = Self(1 << 10);
    pub const MANAGE_BETAKEYS: Self = Self(1 << 11);
    pub const MANAGE_REPORTS: Self = Self(1 << 12);
    pub const MANAGE_DOCS: Self = Self(1 << 13);
    pub const MANAGE_BADGES: Self = Self(1 << 14);
    pub const VIEW_RAP_LOGS: Self = Self(1 << 15);
    pub const MANAGE_PRIVILEGES: Self = Self(1 << 16);
    pub const SEND_ALERTS: Self = Self(1 << 17);
    pub const CHAT_MOD: Self = Self(1 << 18);
    pub const KICK_USERS: Self = Self(1 << 19);
    pub const PENDING_VERIFICATION: Self = Self(1 << 20);
    pub const TOURNAMENT_STAFF: Self = Self(1 << 21);

    const NAMED: [(Self, &'static str); 22] = [
        (Self::PUBLIC, "public"),
        (Self::NORMAL, "normal"),
        (Self::DONOR, "donor"),
        (Self::ACCESS_RAP, "access_rap"),
        (Self::MANAGE_USERS, "manage_users"),
        (Self::BAN_USERS, "ban_users"),
        (Self::SILENCE_USERS, "silence_users"),
        (Self::WIPE_USERS, "wipe_users"),
        (Self::MANAGE_BEATMAPS, "manage_beatmaps"),
        (Self::MANAGE_SERVERS, "manage_servers"),
        (Self::MANAGE_SETTINGS, "manage_settings"),
        (Self::MANAGE_BETAKEYS, "manage_betakeys"),
        (Self::MANAGE_REPORTS, "manage_reports"),
        (Self::MANAGE_DOCS, "manage_docs"),
        (Self::MANAGE_BADGES, "manage_badges"),
        (Self::VIEW_RAP_LOGS, "view_rap_logs"),
        (Self::MANAGE_PRIVILEGES, "manage_privileges"),
        (Self::SEND_ALERTS, "send_alerts"),
        (Self::CHAT_MOD, "chat_mod"),
        (Self::KICK_USERS, "kick_users"),
        (Self::PENDING_VERIFICATION, "pending_verification"),
        (Self::TOURNAMENT_STAFF, "tournament_staff"),
    ];

    pub const fn empty() -> Self {
        Self(0)
    }

    /// Wrap a raw bitmask as read from storage. Unknown bits are preserved.
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    /// True when every capability in `required` is present.
    pub const fn has_all(self, required: Self) -> bool {
        self.0 & required.0 == required.0
    }

    /// True when at least one capability in `candidates` is present.
    pub const fn has_any(self, candidates: Self) -> bool {
        self.0 & candidates.0 != 0
    }

    /// Base "account is active" bit. Restricted or deleted accounts lack it.
    pub const fn is_active(self) -> bool {
        self.has_all(Self::PUBLIC)
    }

    pub const fn can_login(self) -> bool {
        self.has_all(Self::NORMAL)
    }

    pub const fn is_pending_verification(self) -> bool {
        self.has_all(Self::PENDING_VERIFICATION)
    }

    pub fn without(self, removed: Self) -> Self {
        Self(self.0 & !removed.0)
    }

    /// Names of the known capabilities present, in bit order.
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(flag, _)| self.has_all(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl BitOr for Privileges {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Privileges {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Privileges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names().join("|"))
    }
}

/// Account flags bitmask (display and moderation markers).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct UserFlags(u64);

impl UserFlags {
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn has_all(self, required: Self) -> bool {
        self.0 & required.0 == required.0
    }

    pub const fn has_any(self, candidates: Self) -> bool {
        self.0 & candidates.0 != 0
    }
}
