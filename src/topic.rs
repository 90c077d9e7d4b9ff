use serde::Serialize;
use url::Url;
use utoipa::ToSchema;

use crate::error::AppError;

/// Algae subjects the article pipeline knows how to scrape and render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    BlackBeardAlgae,
    HairAlgae,
    GreenWaterAlgae,
}

/// A canned article section used when the content site yields nothing usable.
#[derive(Debug)]
pub struct FallbackSection {
    pub heading: &'static str,
    pub paragraphs: &'static [&'static str],
}

/// Static per-topic text and addressing.
#[derive(Debug)]
pub struct TopicProfile {
    pub slug: &'static str,
    pub source_path: &'static str,
    pub display_name: &'static str,
    pub short_name: &'static str,
    pub image_prefix: &'static str,
    pub intro_clause: &'static str,
    pub headline: &'static str,
    pub schema_description: &'static str,
    pub conclusion: &'static [&'static str],
    pub fallback: &'static [FallbackSection],
}

static BLACK_BEARD_ALGAE: TopicProfile = TopicProfile {
    slug: "black-beard-algae",
    source_path: "/blogs/algae/black-beard-algae",
    display_name: "Black Beard Algae",
    short_name: "BBA",
    image_prefix: "bba",
    intro_clause: "also known as brush algae, is one of the most stubborn and common problems in planted aquariums",
    headline: "How to Control Black Beard Algae (BBA) in Planted Aquariums",
    schema_description: "Learn effective methods to eliminate and prevent Black Beard Algae in your planted aquarium with this comprehensive guide.",
    conclusion: &[
        "Controlling Black Beard Algae requires understanding the root causes and taking a holistic approach to aquarium maintenance. By following the strategies outlined in this guide, you can effectively combat BBA and prevent its return.",
        "Consistency is key when dealing with algae. Regular maintenance, stable CO2 levels and balanced nutrients will keep your aquarium healthy and beautiful.",
    ],
    fallback: &[
        FallbackSection {
            heading: "What Is Black Beard Algae?",
            paragraphs: &[
                "Black Beard Algae (BBA) is a red algae that grows in dense, dark tufts on hardscape, plant edges and equipment. It feels coarse to the touch and clings firmly to whatever it colonises.",
            ],
        },
        FallbackSection {
            heading: "What Causes Black Beard Algae?",
            paragraphs: &[
                "BBA thrives when CO2 levels fluctuate, when organic waste builds up and when water flow leaves dead spots in the tank. Unstable conditions favour it over healthy plants.",
            ],
        },
        FallbackSection {
            heading: "How to Remove Black Beard Algae",
            paragraphs: &[
                "Trim heavily affected leaves, spot treat hardscape with liquid carbon or diluted hydrogen peroxide during a water change, and scrub equipment by hand.",
                "Siamese algae eaters and Amano shrimp will graze on softened BBA once the tufts have been weakened.",
            ],
        },
        FallbackSection {
            heading: "How to Prevent Black Beard Algae",
            paragraphs: &[
                "Keep CO2 injection stable through the photoperiod, improve circulation, avoid overfeeding and perform regular water changes to keep organic waste low.",
            ],
        },
    ],
};

static HAIR_ALGAE: TopicProfile = TopicProfile {
    slug: "hair-algae",
    source_path: "/blogs/algae/hair-algae",
    display_name: "Hair Algae",
    short_name: "Hair Algae",
    image_prefix: "hair-algae",
    intro_clause: "a group of filamentous algae that forms long green strands, quickly tangles around plants and smothers new growth",
    headline: "How to Get Rid of Hair Algae in Planted Aquariums",
    schema_description: "Learn how to remove hair algae from your aquarium and stop it from coming back with this practical guide.",
    conclusion: &[
        "Beating Hair Algae comes down to balancing light, CO2 and nutrients so that your plants outcompete the algae. By following the steps in this guide you can clear existing growth and keep it from returning.",
        "Stay patient and consistent. Manual removal combined with steady tank parameters will restore a clean, healthy aquascape.",
    ],
    fallback: &[
        FallbackSection {
            heading: "What Is Hair Algae?",
            paragraphs: &[
                "Hair Algae is a catch-all name for filamentous green algae that grows as long, fine threads. It attaches to plants, substrate and decor and can spread across a tank within days.",
            ],
        },
        FallbackSection {
            heading: "What Causes Hair Algae?",
            paragraphs: &[
                "Excess light, nutrient imbalances and low CO2 give hair algae the upper hand, especially in newly set up tanks where plants have not yet established.",
            ],
        },
        FallbackSection {
            heading: "How to Remove Hair Algae",
            paragraphs: &[
                "Twirl strands out with a toothbrush or tweezers, siphon loose filaments during water changes and spot dose liquid carbon on stubborn patches.",
                "Amano shrimp and Florida flagfish are effective hair algae grazers.",
            ],
        },
        FallbackSection {
            heading: "How to Prevent Hair Algae",
            paragraphs: &[
                "Shorten the photoperiod, keep fertilisation consistent with plant demand and maintain good CO2 and flow so plants grow vigorously.",
            ],
        },
    ],
};

static GREEN_WATER_ALGAE: TopicProfile = TopicProfile {
    slug: "green-water-algae",
    source_path: "/blogs/algae/green-water",
    display_name: "Green Water Algae",
    short_name: "Green Water",
    image_prefix: "green-water",
    intro_clause: "a bloom of free-floating microscopic algae that turns the whole water column pea-soup green and blocks light from reaching your plants",
    headline: "How to Clear Green Water Algae in Your Aquarium",
    schema_description: "Learn what causes green water algae blooms and how to clear them for good with this step-by-step guide.",
    conclusion: &[
        "Clearing Green Water Algae means removing the suspended algae and correcting the conditions that triggered the bloom. By following the strategies in this guide you can restore crystal clear water.",
        "Keep light, nutrients and maintenance in balance and a green water bloom is unlikely to return.",
    ],
    fallback: &[
        FallbackSection {
            heading: "What Is Green Water Algae?",
            paragraphs: &[
                "Green Water Algae is a bloom of single-celled algae suspended in the water column. It turns the tank cloudy green and can make fish and plants impossible to see.",
            ],
        },
        FallbackSection {
            heading: "What Causes Green Water Algae?",
            paragraphs: &[
                "Ammonia spikes, excess nutrients and strong or direct sunlight trigger green water, often after substrate disturbance or overfeeding.",
            ],
        },
        FallbackSection {
            heading: "How to Remove Green Water Algae",
            paragraphs: &[
                "A UV sterilizer clears green water within days. A multi-day blackout combined with large water changes also works, as does fine mechanical filtration such as diatom filters.",
            ],
        },
        FallbackSection {
            heading: "How to Prevent Green Water Algae",
            paragraphs: &[
                "Avoid overfeeding, keep the tank out of direct sunlight, stay on top of water changes and make sure the filter is fully cycled.",
            ],
        },
    ],
};

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::BlackBeardAlgae, Topic::HairAlgae, Topic::GreenWaterAlgae];

    pub fn profile(self) -> &'static TopicProfile {
        match self {
            Topic::BlackBeardAlgae => &BLACK_BEARD_ALGAE,
            Topic::HairAlgae => &HAIR_ALGAE,
            Topic::GreenWaterAlgae => &GREEN_WATER_ALGAE,
        }
    }

    pub fn slug(self) -> &'static str {
        self.profile().slug
    }

    pub fn display_name(self) -> &'static str {
        self.profile().display_name
    }

    /// Route serving the rendered article, e.g. `/api/hair-algae-article`.
    pub fn route_path(self) -> String {
        format!("/api/{}-article", self.slug())
    }

    /// Page on the content site this topic is scraped from.
    pub fn source_url(self, origin: &Url) -> Result<Url, AppError> {
        origin.join(self.profile().source_path).map_err(|e| {
            AppError::Configuration(format!(
                "cannot build source URL for {} from {}: {}",
                self.slug(),
                origin,
                e
            ))
        })
    }

    /// Local path of the `index`-th image discovered in this topic's article.
    pub fn image_path(self, index: usize) -> String {
        format!("/images/{}-image-{}.jpg", self.profile().image_prefix, index)
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}
