//! Role-specific presentation within pages
//!
//! Presentation only; the navigation guard is the access boundary.

use super::routes::Route;
use crate::auth::Role;

/// Role-specific fragment a page renders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleView {
    Admin,
    Teacher,
    Student,
}

impl RoleView {
    /// Fragment a page shows for a role
    ///
    /// `None` when the page has no per-role fragment (dashboard, resources,
    /// public screens) or when the role gets no fragment at all.
    pub fn for_page(route: Route, role: Role) -> Option<RoleView> {
        match route {
            Route::Attendance | Route::Assessments | Route::Profile => Some(match role {
                Role::SuperAdmin | Role::SchoolAdmin => RoleView::Admin,
                Role::Teacher => RoleView::Teacher,
                Role::Student => RoleView::Student,
            }),
            Route::Fees => match role {
                Role::SuperAdmin | Role::SchoolAdmin => Some(RoleView::Admin),
                Role::Student => Some(RoleView::Student),
                Role::Teacher => None,
            },
            // Admins manage quizzes through the teacher screens
            Route::Quizzes => Some(match role {
                Role::SuperAdmin | Role::SchoolAdmin | Role::Teacher => RoleView::Teacher,
                Role::Student => RoleView::Student,
            }),
            Route::Dashboard
            | Route::Resources
            | Route::Landing
            | Route::Login
            | Route::Unauthorized
            | Route::NotFound => None,
        }
    }
}

/// Whether the resources page offers the upload controls
pub fn can_upload_resources(role: Role) -> bool {
    match role {
        Role::SuperAdmin | Role::SchoolAdmin | Role::Teacher => true,
        Role::Student => false,
    }
}

/// Summary cards on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardCard {
    TotalSchools,
    TotalStudents,
    TotalTeachers,
    Classes,
    AttendanceRate,
    FeesCollected,
    PendingFees,
    CurrentFees,
    OutstandingBalance,
    LearningResources,
    Quizzes,
}

impl DashboardCard {
    /// Every card in display order
    pub const ALL: [DashboardCard; 11] = [
        DashboardCard::TotalSchools,
        DashboardCard::TotalStudents,
        DashboardCard::TotalTeachers,
        DashboardCard::Classes,
        DashboardCard::AttendanceRate,
        DashboardCard::FeesCollected,
        DashboardCard::PendingFees,
        DashboardCard::CurrentFees,
        DashboardCard::OutstandingBalance,
        DashboardCard::LearningResources,
        DashboardCard::Quizzes,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            DashboardCard::TotalSchools => "Total Schools",
            DashboardCard::TotalStudents => "Total Students",
            DashboardCard::TotalTeachers => "Total Teachers",
            DashboardCard::Classes => "Classes",
            DashboardCard::AttendanceRate => "Attendance Rate",
            DashboardCard::FeesCollected => "Fees Collected",
            DashboardCard::PendingFees => "Pending Fees",
            DashboardCard::CurrentFees => "Current Fees",
            DashboardCard::OutstandingBalance => "Outstanding Balance",
            DashboardCard::LearningResources => "Learning Resources",
            DashboardCard::Quizzes => "Quizzes",
        }
    }

    /// Caption under the figure, or `None` if the role does not see the card
    pub fn caption(&self, role: Role) -> Option<&'static str> {
        use Role::*;

        let caption = match (self, role) {
            (DashboardCard::TotalSchools, SuperAdmin) => "Schools in the system",
            (DashboardCard::TotalSchools, _) => return None,

            (
                DashboardCard::TotalStudents
                | DashboardCard::TotalTeachers
                | DashboardCard::FeesCollected
                | DashboardCard::PendingFees,
                SuperAdmin,
            ) => "Across all schools",
            (
                DashboardCard::TotalStudents
                | DashboardCard::TotalTeachers
                | DashboardCard::FeesCollected
                | DashboardCard::PendingFees,
                SchoolAdmin,
            ) => "In your school",
            (
                DashboardCard::TotalStudents
                | DashboardCard::TotalTeachers
                | DashboardCard::FeesCollected
                | DashboardCard::PendingFees,
                Teacher | Student,
            ) => return None,

            (DashboardCard::Classes, SuperAdmin) => "Across all schools",
            (DashboardCard::Classes, SchoolAdmin) => "In your school",
            (DashboardCard::Classes, Teacher) => "Assigned to you",
            (DashboardCard::Classes, Student) => return None,

            (DashboardCard::AttendanceRate, SuperAdmin) => "System average",
            (DashboardCard::AttendanceRate, SchoolAdmin) => "School average",
            (DashboardCard::AttendanceRate, Teacher) => "In your classes",
            (DashboardCard::AttendanceRate, Student) => "Your attendance",

            (DashboardCard::CurrentFees, Student) => "Total for current term",
            (DashboardCard::OutstandingBalance, Student) => "Amount due",
            (DashboardCard::CurrentFees | DashboardCard::OutstandingBalance, _) => return None,

            (DashboardCard::LearningResources, Student) => "Available to you",
            (DashboardCard::Quizzes, Student) => "Assigned to you",
            (DashboardCard::LearningResources | DashboardCard::Quizzes, Teacher) => "Created by you",
            (DashboardCard::LearningResources | DashboardCard::Quizzes, SchoolAdmin) => "In your school",
            (DashboardCard::LearningResources | DashboardCard::Quizzes, SuperAdmin) => "Across all schools",
        };
        Some(caption)
    }
}

/// Cards a role sees, in display order, with their captions
pub fn dashboard_cards(role: Role) -> Vec<(DashboardCard, &'static str)> {
    DashboardCard::ALL
        .into_iter()
        .filter_map(|card| card.caption(role).map(|caption| (card, caption)))
        .collect()
}
