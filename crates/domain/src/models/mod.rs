//! Domain models for the ministry data exchange portal.

pub mod activity_log;
pub mod analytics;
pub mod dashboard;
pub mod data_request;
pub mod help;
pub mod ministry;
pub mod password_reset;
pub mod setting;
pub mod stats;
pub mod user;

pub use activity_log::{
    LogAction, LogEntry, LogFilter, LogListResponse, LogQuery, NewLogEntry, LOG_SCREEN_LIMIT,
};
pub use analytics::{
    monthly_series, trend_start, AnalyticsReport, MinistryRanking, MonthlyCount,
    TOP_MINISTRIES_LIMIT,
};
pub use dashboard::{
    AdminDashboard, LabelCount, MinistryDashboard, RateSummary, RecentActivity, RecentRequest,
    UserDashboard,
};
pub use data_request::{
    CreateDataRequest, DataRequest, DataRequestFilter, DataRequestListResponse, DataRequestQuery,
    PriorityBreakdown, RequestPriority, RequestStatCards, RequestStatus, RequestStatusBreakdown,
    RespondToRequest,
};
pub use help::{
    CreateHelpRequest, Faq, HelpCenter, HelpRequest, HelpRequestStatus, HelpResource,
};
pub use ministry::{
    CreateMinistryRequest, Ministry, MinistryOption, MinistryStatus, MinistryWithCounts,
    UpdateMinistryRequest,
};
pub use password_reset::{
    ForgotPasswordRequest, ResetTokenQuery, ResetTokenStatus, ResetWithTokenRequest,
    FORGOT_PASSWORD_MESSAGE, INVALID_RESET_TOKEN_MESSAGE, RESET_TOKEN_TTL_MINUTES,
};
pub use setting::{SettingKey, SystemSettings, UpdateSettingsRequest, BACKUP_FREQUENCIES};
pub use stats::{growth_rate, humanize_label, percent_of_max, percentage, round1};
pub use user::{
    initials, ChangePasswordRequest, CreateUserRequest, LoginRequest, RegisterRequest,
    ResetUserPasswordRequest, UpdateProfileRequest, UpdateUserRequest, User, UserListQuery,
    RoleBreakdown, UserListResponse, UserRole, UserSummary,
};
