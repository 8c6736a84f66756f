//! Static support directory served at `/api/resources`.
//! Content is fixed at build time; nothing here touches the database.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Resource {
    pub name: &'static str,
    pub description: &'static str,
    pub contact: &'static str,
    pub availability: &'static str,
    pub region: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Story {
    pub title: &'static str,
    pub author: &'static str,
    pub excerpt: &'static str,
    pub read_time: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceDirectory {
    pub helplines: &'static [Resource],
    pub counseling_programs: &'static [Resource],
    pub stories: &'static [Story],
}

pub const HELPLINES: &[Resource] = &[
    Resource {
        name: "National Suicide Prevention Lifeline (US)",
        description: "24/7 free and confidential support for people in distress.",
        contact: "988",
        availability: "24/7",
        region: "United States",
    },
    Resource {
        name: "Crisis Text Line (US)",
        description: "Text-based support for anyone in crisis.",
        contact: "Text HOME to 741741",
        availability: "24/7",
        region: "United States",
    },
    Resource {
        name: "SAMHSA National Helpline",
        description: "Treatment referral and information service for mental health.",
        contact: "1-800-662-4357",
        availability: "24/7",
        region: "United States",
    },
    Resource {
        name: "Samaritans (UK)",
        description: "Confidential emotional support for anyone in distress.",
        contact: "116 123",
        availability: "24/7",
        region: "United Kingdom",
    },
    Resource {
        name: "Beyond Blue (Australia)",
        description: "Support service for depression, anxiety, and suicide prevention.",
        contact: "1300 22 4636",
        availability: "24/7",
        region: "Australia",
    },
    Resource {
        name: "Lifeline (Australia)",
        description: "Crisis support and suicide prevention services.",
        contact: "13 11 14",
        availability: "24/7",
        region: "Australia",
    },
];

pub const COUNSELING_PROGRAMS: &[Resource] = &[
    Resource {
        name: "BetterHelp",
        description: "Online therapy platform with licensed therapists.",
        contact: "betterhelp.com",
        availability: "Flexible scheduling",
        region: "Global",
    },
    Resource {
        name: "Talkspace",
        description: "Virtual therapy via text, audio, and video.",
        contact: "talkspace.com",
        availability: "Flexible scheduling",
        region: "Global",
    },
    Resource {
        name: "7 Cups",
        description: "Free emotional support from trained listeners.",
        contact: "7cups.com",
        availability: "24/7",
        region: "Global",
    },
    Resource {
        name: "Open Path Collective",
        description: "Affordable therapy with membership fee.",
        contact: "openpathcollective.org",
        availability: "Varies",
        region: "United States",
    },
];

pub const STORIES: &[Story] = &[
    Story {
        title: "From Silence to Strength: My Journey with Anxiety",
        author: "Anonymous",
        excerpt: "For years, I thought asking for help was weakness. Then I realized that acknowledging my struggles was the bravest thing I'd ever done. Here's how therapy changed my life...",
        read_time: "5 min read",
    },
    Story {
        title: "A Father's Perspective: Postpartum Depression in Men",
        author: "James M.",
        excerpt: "No one talks about how becoming a father can trigger depression in men too. I want to share my story so others don't feel alone in this experience...",
        read_time: "7 min read",
    },
    Story {
        title: "Breaking the Cycle: How I Learned to Express Emotions",
        author: "Michael T.",
        excerpt: "Growing up, I was taught that men don't cry. It took hitting rock bottom to realize that emotions aren't weakness, they're human. My path to emotional freedom...",
        read_time: "6 min read",
    },
    Story {
        title: "College, Career, and Coping: A Student's Mental Health Journey",
        author: "David L.",
        excerpt: "The pressure to succeed academically while managing mental health felt impossible. Here's how I found balance and learned to prioritize my wellbeing...",
        read_time: "4 min read",
    },
];

pub fn directory() -> ResourceDirectory {
    ResourceDirectory {
        helplines: HELPLINES,
        counseling_programs: COUNSELING_PROGRAMS,
        stories: STORIES,
    }
}
