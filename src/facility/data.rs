//! Built-in facility table (Bengaluru metropolitan area)

use super::{Facility, FacilityType};
use crate::geo::Coordinates;

use FacilityType::*;

/// (id, name, type, region, lat, lng, capacity, ventilator capacity, alert threshold)
type Row = (&'static str, &'static str, FacilityType, &'static str, f64, f64, u32, u32, u8);

const FACILITIES: &[Row] = &[
    ("central", "Central Hospital", MajorHospital, "Central", 12.9716, 77.5946, 1000, 50, 20),
    ("city-general", "City General Hospital", MajorHospital, "North", 12.9716, 77.5946, 800, 40, 20),
    ("metro-med", "Metropolitan Medical Center", MajorHospital, "South", 12.9716, 77.5946, 900, 45, 20),
    ("north-wing", "North Wing Medical Center", RegionalCenter, "North", 12.9716, 77.5946, 500, 25, 15),
    ("south-district", "South District Hospital", RegionalCenter, "South", 12.9716, 77.5946, 500, 25, 15),
    ("emergency-1", "Emergency Care Unit 1", EmergencyCenter, "Central", 12.9716, 77.5946, 200, 20, 25),
    ("trauma-north", "Trauma Center North", EmergencyCenter, "North", 12.9716, 77.5946, 250, 25, 25),
    ("storage-a", "Central Storage A", Storage, "Central", 12.9716, 77.5946, 5000, 100, 30),
    ("storage-b", "Central Storage B", Storage, "Central", 12.9716, 77.5946, 5000, 100, 30),
    ("icu-complex", "ICU Complex", SpecializedUnit, "Central", 12.9716, 77.5946, 300, 50, 20),
    ("central-general", "Central General Hospital", MajorHospital, "Central", 12.9716, 77.5946, 1000, 50, 20),
    ("city-central", "City Central Medical Center", MajorHospital, "Central", 12.9766, 77.5993, 800, 40, 20),
    ("metro-central", "Metro Central Hospital", MajorHospital, "Central", 12.9800, 77.6020, 700, 30, 20),
    ("north-general", "North General Hospital", MajorHospital, "North", 13.0416, 77.5946, 900, 45, 20),
    ("north-medical", "North Medical Institute", MajorHospital, "North", 13.0516, 77.5746, 750, 35, 20),
    ("north-specialty", "North Specialty Hospital", MajorHospital, "North", 13.0616, 77.5546, 650, 28, 20),
    ("south-general", "South General Hospital", MajorHospital, "South", 12.9116, 77.5946, 850, 42, 20),
    ("south-medical", "South Medical Center", MajorHospital, "South", 12.9016, 77.5846, 780, 38, 20),
    ("north-regional-1", "North Regional Center 1", RegionalCenter, "North", 13.0616, 77.5846, 500, 25, 15),
    ("north-regional-2", "North Regional Center 2", RegionalCenter, "North", 13.0716, 77.5646, 450, 22, 15),
    ("north-regional-3", "North Regional Center 3", RegionalCenter, "North", 13.0816, 77.5446, 420, 20, 15),
    ("south-regional-1", "South Regional Center 1", RegionalCenter, "South", 12.8916, 77.5946, 480, 24, 15),
    ("south-regional-2", "South Regional Center 2", RegionalCenter, "South", 12.8816, 77.5846, 460, 23, 15),
    ("emergency-central-1", "Central Emergency Center 1", EmergencyCenter, "Central", 12.9716, 77.6046, 200, 20, 25),
    ("emergency-north-1", "North Emergency Center 1", EmergencyCenter, "North", 13.0316, 77.5946, 220, 22, 25),
    ("emergency-south-1", "South Emergency Center 1", EmergencyCenter, "South", 12.9016, 77.5946, 210, 21, 25),
    ("east-general", "East General Hospital", MajorHospital, "East", 12.9716, 77.6846, 880, 38, 20),
    ("east-medical", "East Medical Center", MajorHospital, "East", 12.9616, 77.6746, 760, 30, 20),
    ("west-general", "West General Hospital", MajorHospital, "West", 12.9216, 77.5046, 870, 36, 20),
    ("west-medical", "West Medical Center", MajorHospital, "West", 12.9316, 77.5146, 750, 32, 20),
    ("east-regional-1", "East Regional Center 1", RegionalCenter, "East", 12.9516, 77.6846, 470, 22, 15),
    ("west-regional-1", "West Regional Center 1", RegionalCenter, "West", 12.9416, 77.5046, 490, 23, 15),
    ("northeast-general", "Northeast General Hospital", MajorHospital, "Northeast", 13.0816, 77.6446, 850, 35, 20),
    ("northeast-medical", "Northeast Medical Center", MajorHospital, "Northeast", 13.0916, 77.6546, 780, 32, 20),
    ("northeast-regional-1", "Northeast Regional Center 1", RegionalCenter, "Northeast", 13.0716, 77.6646, 460, 20, 15),
    ("southwest-general", "Southwest General Hospital", MajorHospital, "Southwest", 12.8916, 77.5246, 890, 37, 20),
    ("southwest-medical", "Southwest Medical Center", MajorHospital, "Southwest", 12.8816, 77.5146, 770, 31, 20),
    ("southwest-regional-1", "Southwest Regional Center 1", RegionalCenter, "Southwest", 12.8716, 77.5046, 480, 21, 15),
    ("emergency-northeast-1", "Northeast Emergency Center", EmergencyCenter, "Northeast", 13.0616, 77.6346, 230, 23, 25),
    ("emergency-southwest-1", "Southwest Emergency Center", EmergencyCenter, "Southwest", 12.8616, 77.4946, 215, 22, 25),
    ("cardiac-center-1", "Cardiac Specialty Center", SpecializedUnit, "Central", 12.9816, 77.5846, 300, 45, 30),
    ("neuro-center-1", "Neurology Specialty Center", SpecializedUnit, "North", 13.0416, 77.5746, 280, 40, 30),
    ("north-regional-4", "North Regional Center 4", RegionalCenter, "North", 13.0516, 77.5846, 440, 20, 15),
    ("south-regional-3", "South Regional Center 3", RegionalCenter, "South", 12.8816, 77.5846, 450, 21, 15),
    ("storage-c", "Central Storage C", Storage, "Central", 12.9716, 77.5746, 5000, 0, 10),
    ("storage-d", "Central Storage D", Storage, "Central", 12.9816, 77.5646, 5000, 0, 10),
    ("central-specialty", "Central Specialty Hospital", MajorHospital, "Central", 12.9616, 77.5846, 920, 40, 20),
    ("north-advanced", "North Advanced Care Hospital", MajorHospital, "North", 13.0216, 77.5946, 880, 38, 20),
    ("south-advanced", "South Advanced Care Hospital", MajorHospital, "South", 12.9116, 77.5946, 860, 36, 20),
    ("east-advanced", "East Advanced Care Hospital", MajorHospital, "East", 12.9716, 77.6946, 840, 35, 20),
    ("west-advanced", "West Advanced Care Hospital", MajorHospital, "West", 12.9716, 77.4946, 830, 34, 20),
    ("central-research", "Central Research Hospital", SpecializedUnit, "Central", 12.9916, 77.5946, 400, 50, 30),
];

pub(super) fn builtin_facilities() -> Vec<Facility> {
    FACILITIES
        .iter()
        .map(
            |&(id, name, facility_type, region, lat, lng, capacity, ventilator_capacity, alert_threshold)| {
                Facility {
                    id: id.to_string(),
                    name: name.to_string(),
                    facility_type,
                    region: region.to_string(),
                    coordinates: Some(Coordinates { lat, lng }),
                    capacity,
                    ventilator_capacity,
                    alert_threshold,
                }
            },
        )
        .collect()
}
