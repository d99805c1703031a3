use serde::Serialize;

/// An upcoming event tickets can be bought for.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Show {
    pub name: &'static str,
    pub date: &'static str,
    pub time: &'static str,
    pub location: &'static str,
    pub description: &'static str,
}

pub const SHOWS: &[Show] = &[
    Show {
        name: "The Phantom of the Opera",
        date: "May 20, 2025",
        time: "7:00 PM",
        location: "Grand Theater, Downtown, Dublin",
        description: "A timeless classic musical that will leave you mesmerized.",
    },
    Show {
        name: "Rock Fest 2025",
        date: "June 3, 2025",
        time: "5:00 PM",
        location: "City Arena, Limerick",
        description: "An electrifying night of rock music featuring top bands.",
    },
    Show {
        name: "Stand-Up Comedy Night",
        date: "June 25, 2025",
        time: "8:30 PM",
        location: "Comedy Club, Belfast",
        description: "Laugh out loud with the best comedians in town.",
    },
];
