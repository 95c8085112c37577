//! The built-in marker handlers.

pub mod accessors;
pub mod cleanup;
pub mod constructor;
pub mod equals_hash_code;
pub mod print_tree;
pub mod sneaky_throws;
pub(crate) mod util;

use crate::registry::{MarkerKind, Registration, SchedulingFlags};

pub(crate) fn builtin_registrations() -> Vec<Registration> {
    vec![
        Registration {
            marker: MarkerKind::EqualsAndHashCode,
            flags: SchedulingFlags::default(),
            handler: Box::new(equals_hash_code::HandleEqualsAndHashCode),
        },
        Registration {
            marker: MarkerKind::Getter,
            flags: SchedulingFlags::default(),
            handler: Box::new(accessors::HandleAccessor::getter()),
        },
        Registration {
            marker: MarkerKind::Setter,
            flags: SchedulingFlags::default(),
            handler: Box::new(accessors::HandleAccessor::setter()),
        },
        Registration {
            marker: MarkerKind::Cleanup,
            flags: SchedulingFlags {
                defer_until_post_diet: true,
                ..Default::default()
            },
            handler: Box::new(cleanup::HandleCleanup),
        },
        Registration {
            marker: MarkerKind::SneakyThrows,
            flags: SchedulingFlags {
                defer_until_post_diet: true,
                ..Default::default()
            },
            handler: Box::new(sneaky_throws::HandleSneakyThrows),
        },
        Registration {
            marker: MarkerKind::NoArgsConstructor,
            flags: SchedulingFlags {
                defer_until_build_members: true,
                ..Default::default()
            },
            handler: Box::new(constructor::HandleConstructor::no_args()),
        },
        Registration {
            marker: MarkerKind::RequiredArgsConstructor,
            flags: SchedulingFlags {
                defer_until_build_members: true,
                ..Default::default()
            },
            handler: Box::new(constructor::HandleConstructor::required_args()),
        },
        Registration {
            marker: MarkerKind::AllArgsConstructor,
            flags: SchedulingFlags {
                defer_until_build_members: true,
                ..Default::default()
            },
            handler: Box::new(constructor::HandleConstructor::all_args()),
        },
        Registration {
            marker: MarkerKind::PrintTree,
            flags: SchedulingFlags::default(),
            handler: Box::new(print_tree::HandlePrintTree),
        },
    ]
}
